// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train-text`    — triage text classifier
//   2. `train-tabular` — mental-health risk classifier
//   3. `merge-dataset` — append one triage JSON file to another
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, MergeDatasetArgs, TrainTabularArgs, TrainTextArgs};

use crate::application::report::RunReport;

#[derive(Parser, Debug)]
#[command(
    name = "clinic-trainer",
    version,
    about = "Train the triage and mental-health classifiers and export them for the web runtime."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::TrainText(args)    => run_train_text(args),
            Commands::TrainTabular(args) => run_train_tabular(args),
            Commands::MergeDataset(args) => run_merge(args),
        }
    }
}

fn run_train_text(args: TrainTextArgs) -> Result<()> {
    use crate::application::train_text_use_case::TrainTextUseCase;

    tracing::info!("Training triage classifier on '{}'", args.dataset.display());
    let report = TrainTextUseCase::new(args.into()).execute()?;
    print_report(&report);
    Ok(())
}

fn run_train_tabular(args: TrainTabularArgs) -> Result<()> {
    use crate::application::train_tabular_use_case::TrainTabularUseCase;

    tracing::info!("Training mental-health classifier on '{}'", args.dataset.display());
    let report = TrainTabularUseCase::new(args.into()).execute()?;
    print_report(&report);
    Ok(())
}

fn run_merge(args: MergeDatasetArgs) -> Result<()> {
    use crate::data::loader::{DatasetLog, TextDatasetLoader};
    use crate::domain::traits::ExampleSource;

    let incoming = TextDatasetLoader::new(&args.input).load_all()?;
    let total    = DatasetLog::new(&args.dataset).append(&incoming)?;
    println!("Merged {} examples into '{}' ({} total)", incoming.len(), args.dataset.display(), total);
    Ok(())
}

fn print_report(report: &RunReport) {
    if let Some(last) = report.history.last() {
        print!("Trained on {} examples: loss={:.4} acc={:.1}%", report.examples, last.loss, last.accuracy * 100.0);
        if let Some(va) = last.val_accuracy {
            print!(" val_acc={:.1}%", va * 100.0);
        }
        println!();
    }
    if let Some(path) = &report.metadata {
        println!("Metadata: {}", path.display());
    }
    match &report.model {
        Some(saved) => println!("Model:    {} ({:?})", saved.bundle.model_json.display(), saved.strategy),
        None        => println!("Model:    not saved (see log)"),
    }
}

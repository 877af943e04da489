// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train-text`, `train-tabular`
// and `merge-dataset`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    train_tabular_use_case::{TabularTrainConfig, DEFAULT_CATEGORICAL_FEATURES},
    train_text_use_case::TextTrainConfig,
};
use crate::data::assembler::MAX_LEN;
use crate::infra::exporter::ExportMode;
use crate::ml::trainer::FitConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the triage text classifier on a JSON dataset
    TrainText(TrainTextArgs),

    /// Train the mental-health risk classifier on a survey CSV
    TrainTabular(TrainTabularArgs),

    /// Append the examples of one JSON dataset to another, atomically
    MergeDataset(MergeDatasetArgs),
}

/// How the trained model is written out
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportModeArg {
    /// Native record when the output directory is writable, else manual
    Auto,
    /// burn record + bundle; falls back to manual on failure
    Native,
    /// Bundle through the save handler only
    Manual,
}

impl From<ExportModeArg> for ExportMode {
    fn from(a: ExportModeArg) -> Self {
        match a {
            ExportModeArg::Auto   => ExportMode::Auto,
            ExportModeArg::Native => ExportMode::Native,
            ExportModeArg::Manual => ExportMode::Manual,
        }
    }
}

/// Flags shared by both training commands
#[derive(Args, Debug)]
pub struct FitArgs {
    /// Fraction of examples held out at the end for validation
    #[arg(long, default_value_t = 0.2)]
    pub validation_split: f64,

    /// Train in file order instead of shuffling
    #[arg(long)]
    pub no_shuffle: bool,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seed for initialisation, shuffling and dropout
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = ExportModeArg::Auto)]
    pub export_mode: ExportModeArg,
}

impl FitArgs {
    fn into_fit_config(self, epochs: usize, batch_size: usize) -> FitConfig {
        FitConfig {
            epochs,
            batch_size,
            validation_split: self.validation_split,
            shuffle:          !self.no_shuffle,
            learning_rate:    self.lr,
            seed:             self.seed,
        }
    }
}

/// All arguments for the `train-text` command
#[derive(Args, Debug)]
pub struct TrainTextArgs {
    /// JSON array of {text, label}
    #[arg(long, default_value = "data/triage_dataset.json")]
    pub dataset: PathBuf,

    /// Directory for metadata.json, model.json, weights.bin
    #[arg(long, default_value = "models/triage")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = 30)]
    pub epochs: usize,

    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,

    /// Tokens kept per example (longer texts are truncated)
    #[arg(long, default_value_t = MAX_LEN)]
    pub max_len: usize,

    #[arg(long, default_value_t = 16)]
    pub embedding_dim: usize,

    #[arg(long, default_value_t = 16)]
    pub hidden_units: usize,

    #[command(flatten)]
    pub fit: FitArgs,
}

/// Convert CLI args into the application-layer config.
/// The application layer never sees clap types.
impl From<TrainTextArgs> for TextTrainConfig {
    fn from(a: TrainTextArgs) -> Self {
        let export_mode = a.fit.export_mode.into();
        TextTrainConfig {
            dataset:       a.dataset,
            output_dir:    a.output_dir,
            max_len:       a.max_len,
            embedding_dim: a.embedding_dim,
            hidden_units:  a.hidden_units,
            fit:           a.fit.into_fit_config(a.epochs, a.batch_size),
            export_mode,
        }
    }
}

/// All arguments for the `train-tabular` command
#[derive(Args, Debug)]
pub struct TrainTabularArgs {
    /// Survey CSV with a header row and a `treatment` column
    #[arg(long, default_value = "data/survey.csv")]
    pub dataset: PathBuf,

    #[arg(long, default_value = "models/mental_health")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Categorical columns in vector order (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_CATEGORICAL_FEATURES.map(String::from))]
    pub features: Vec<String>,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    #[command(flatten)]
    pub fit: FitArgs,
}

impl From<TrainTabularArgs> for TabularTrainConfig {
    fn from(a: TrainTabularArgs) -> Self {
        let export_mode = a.fit.export_mode.into();
        TabularTrainConfig {
            dataset:              a.dataset,
            output_dir:           a.output_dir,
            categorical_features: a.features,
            dropout:              a.dropout,
            fit:                  a.fit.into_fit_config(a.epochs, a.batch_size),
            export_mode,
            ..TabularTrainConfig::default()
        }
    }
}

/// All arguments for the `merge-dataset` command
#[derive(Args, Debug)]
pub struct MergeDatasetArgs {
    /// Examples to append
    #[arg(long)]
    pub input: PathBuf,

    /// Dataset log to append to (created if missing)
    #[arg(long, default_value = "data/triage_dataset.json")]
    pub dataset: PathBuf,
}

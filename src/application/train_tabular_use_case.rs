// ============================================================
// Layer 2 — TrainTabularUseCase
// ============================================================
// Orchestrates the mental-health risk pipeline in order:
//
//   Step 1: Load the survey CSV          (Layer 4 - data)
//   Step 2: Encode rows in file order    (Layer 4 - data)
//           rows failing the age filter are dropped here
//   Step 3: Write metadata.json          (Layer 6 - infra)
//   Step 4: Save config, open metrics,   (Layer 6 - infra)
//           resolve the export strategy
//   Step 5: Build + fit the model        (Layer 5 - ml)
//   Step 6: Export the model             (Layer 6 - infra)
//
// Categorical ids depend on row order, so the encoder must see
// the rows exactly as the file lists them.

use std::path::PathBuf;

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::application::report::{finish_run, open_run_log, RunReport};
use crate::data::{
    assembler::{assemble_tabular, TabularLayout},
    encoder::CategoricalEncoder,
    loader::SurveyLoader,
};
use crate::domain::{error::TrainingError, traits::ExampleSource};
use crate::infra::{
    exporter::{ExportMode, ExportStrategy},
    metadata::{write_metadata, TabularMetadata},
};
use crate::ml::{
    model::TabularClassifierConfig,
    trainer::{fit, FitConfig},
    training_device, TrainingBackend,
};

/// Survey columns encoded as categorical features, in vector order
pub const DEFAULT_CATEGORICAL_FEATURES: [&str; 20] = [
    "self_employed",
    "family_history",
    "work_interfere",
    "no_employees",
    "remote_work",
    "tech_company",
    "benefits",
    "care_options",
    "wellness_program",
    "seek_help",
    "anonymity",
    "leave",
    "mental_health_consequence",
    "phys_health_consequence",
    "coworkers",
    "supervisor",
    "mental_health_interview",
    "phys_health_interview",
    "mental_vs_physical",
    "obs_consequence",
];

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularTrainConfig {
    pub dataset:              PathBuf,
    pub output_dir:           PathBuf,
    pub categorical_features: Vec<String>,
    pub hidden_units:         usize,
    pub second_hidden_units:  usize,
    pub dropout:              f64,
    pub fit:                  FitConfig,
    pub export_mode:          ExportMode,
}

impl Default for TabularTrainConfig {
    fn default() -> Self {
        Self {
            dataset:              PathBuf::from("data/survey.csv"),
            output_dir:           PathBuf::from("models/mental_health"),
            categorical_features: DEFAULT_CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
            hidden_units:         16,
            second_hidden_units:  8,
            dropout:              0.2,
            fit:                  FitConfig::tabular(),
            export_mode:          ExportMode::Auto,
        }
    }
}

// ─── TrainTabularUseCase ─────────────────────────────────────────────────────
pub struct TrainTabularUseCase {
    config: TabularTrainConfig,
}

impl TrainTabularUseCase {
    pub fn new(config: TabularTrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RunReport> {
        let cfg = &self.config;

        // ── Step 1: Load rows ─────────────────────────────────────────────────
        let rows = SurveyLoader::new(&cfg.dataset).load_all()?;

        // ── Step 2: Encode ────────────────────────────────────────────────────
        let layout = TabularLayout::new(cfg.categorical_features.iter().cloned());
        let mut encoder = CategoricalEncoder::new();
        let set = assemble_tabular(&rows, &layout, &mut encoder);
        tracing::info!(
            "Feature matrix: {:?} ({} rows dropped by the age filter)",
            set.features.shape(),
            rows.len() - set.len(),
        );
        if set.is_empty() {
            return Err(TrainingError::EmptyDataset.into());
        }

        // ── Step 3: Metadata first ────────────────────────────────────────────
        let metadata = match write_metadata(&cfg.output_dir, &TabularMetadata::new(&layout, &encoder)) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!("Could not write metadata: {e}");
                None
            }
        };

        // ── Step 4: Config, metrics log, export strategy ──────────────────────
        // Neither side file is required; a failure only costs that file
        let metrics  = open_run_log(&cfg.output_dir, cfg);
        let strategy = ExportStrategy::resolve(cfg.export_mode, &cfg.output_dir);
        tracing::info!("Export strategy: {:?}", strategy);

        // ── Step 5: Build + fit ───────────────────────────────────────────────
        let device = training_device();
        let mut rng = StdRng::seed_from_u64(cfg.fit.seed);
        let model = TabularClassifierConfig::new(layout.width())
            .with_hidden_units(cfg.hidden_units)
            .with_second_hidden_units(cfg.second_hidden_units)
            .with_dropout(cfg.dropout)
            .init::<TrainingBackend>(&mut rng, &device);

        let (model, history) = fit(model, &set, &cfg.fit, &device, |m| {
            if let Some(Err(e)) = metrics.as_ref().map(|log| log.log(m)) {
                tracing::warn!("Could not log epoch {}: {e:#}", m.epoch);
            }
        })?;

        // ── Step 6: Export ────────────────────────────────────────────────────
        finish_run(&model, &cfg.output_dir, strategy, set.len(), metadata, history)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use tempfile::tempdir;

    const SURVEY: &str = "\
Age,Gender,family_history,remote_work,treatment
25,Male,No,Yes,No
17,Female,Yes,No,Yes
44,female,Yes,,Yes
abc,M,No,No,No
31,Non-binary,No,Yes,Yes
100,m,Yes,Yes,No
";

    fn config(dir: &std::path::Path) -> TabularTrainConfig {
        TabularTrainConfig {
            dataset:              dir.join("survey.csv"),
            output_dir:           dir.join("out"),
            categorical_features: vec!["family_history".into(), "remote_work".into()],
            fit:                  FitConfig { epochs: 2, batch_size: 2, ..FitConfig::tabular() },
            ..TabularTrainConfig::default()
        }
    }

    #[test]
    fn test_run_drops_bad_ages_and_writes_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("survey.csv"), SURVEY).unwrap();
        let cfg = config(dir.path());

        let report = TrainTabularUseCase::new(cfg.clone()).execute().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.examples, 4);

        let meta: Value =
            serde_json::from_slice(&fs::read(cfg.output_dir.join("metadata.json")).unwrap()).unwrap();
        assert_eq!(meta["inputShape"], serde_json::json!([4]));
        assert_eq!(meta["mappings"]["family_history"]["No"], 0);
        assert_eq!(meta["mappings"]["family_history"]["Yes"], 1);
        assert_eq!(meta["mappings"]["remote_work"]["NA"], 1);
    }

    #[test]
    fn test_unwritable_config_snapshot_does_not_stop_the_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("survey.csv"), SURVEY).unwrap();
        let cfg = config(dir.path());
        fs::create_dir_all(cfg.output_dir.join("train_config.json")).unwrap();
        fs::create_dir_all(cfg.output_dir.join("metrics.csv")).unwrap();

        let report = TrainTabularUseCase::new(cfg.clone()).execute().unwrap();
        assert!(report.is_complete());
        assert!(cfg.output_dir.join("metadata.json").is_file());
        assert!(cfg.output_dir.join("model.json").is_file());
    }

    #[test]
    fn test_only_invalid_ages_fail_fast() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("survey.csv"), "Age,Gender,treatment\n12,Male,Yes\n").unwrap();
        let err = TrainTabularUseCase::new(config(dir.path())).execute().unwrap_err();
        assert!(matches!(err.downcast_ref::<TrainingError>(), Some(TrainingError::EmptyDataset)));
    }

    #[test]
    fn test_default_layout_width() {
        let cfg = TabularTrainConfig::default();
        assert_eq!(TabularLayout::new(cfg.categorical_features).width(), 22);
    }
}

// ============================================================
// Layer 2 — TrainTextUseCase
// ============================================================
// Orchestrates the triage text pipeline in order:
//
//   Step 1: Load the JSON dataset        (Layer 4 - data)
//   Step 2: Build the vocabulary         (Layer 4 - data)
//   Step 3: Write metadata.json          (Layer 6 - infra)
//   Step 4: Vectorise every example      (Layer 4 - data)
//   Step 5: Save config, open metrics,   (Layer 6 - infra)
//           resolve the export strategy
//   Step 6: Build + fit the model        (Layer 5 - ml)
//   Step 7: Export the model             (Layer 6 - infra)
//
// metadata.json goes out before training so a crash or a failed
// export still leaves the preprocessing contract on disk.

use std::path::PathBuf;

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::application::report::{finish_run, open_run_log, RunReport};
use crate::data::{
    assembler::{assemble_text, MAX_LEN},
    loader::TextDatasetLoader,
    vocabulary::Vocabulary,
};
use crate::domain::{error::TrainingError, example::TriageLabel, traits::ExampleSource};
use crate::infra::{
    exporter::{ExportMode, ExportStrategy},
    metadata::{write_metadata, TextMetadata},
};
use crate::ml::{
    model::TextClassifierConfig,
    trainer::{fit, FitConfig},
    training_device, TrainingBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialisable so each run can record exactly what it trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextTrainConfig {
    pub dataset:       PathBuf,
    pub output_dir:    PathBuf,
    pub max_len:       usize,
    pub embedding_dim: usize,
    pub hidden_units:  usize,
    pub fit:           FitConfig,
    pub export_mode:   ExportMode,
}

impl Default for TextTrainConfig {
    fn default() -> Self {
        Self {
            dataset:       PathBuf::from("data/triage_dataset.json"),
            output_dir:    PathBuf::from("models/triage"),
            max_len:       MAX_LEN,
            embedding_dim: 16,
            hidden_units:  16,
            fit:           FitConfig::text(),
            export_mode:   ExportMode::Auto,
        }
    }
}

// ─── TrainTextUseCase ────────────────────────────────────────────────────────
pub struct TrainTextUseCase {
    config: TextTrainConfig,
}

impl TrainTextUseCase {
    pub fn new(config: TextTrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RunReport> {
        let cfg = &self.config;

        // ── Step 1: Load examples ─────────────────────────────────────────────
        // A missing file is fatal; a corrupt one loads as empty
        let examples = TextDatasetLoader::new(&cfg.dataset).load_all()?;
        if examples.is_empty() {
            return Err(TrainingError::EmptyDataset.into());
        }

        // ── Step 2: Vocabulary ────────────────────────────────────────────────
        let vocab = Vocabulary::build(&examples);
        tracing::info!("Vocabulary: {} tokens", vocab.len());

        // ── Step 3: Metadata first ────────────────────────────────────────────
        let metadata = match write_metadata(&cfg.output_dir, &TextMetadata::new(&vocab, cfg.max_len)) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!("Could not write metadata: {e}");
                None
            }
        };

        // ── Step 4: Vectorise ─────────────────────────────────────────────────
        let set = assemble_text(&examples, &vocab, cfg.max_len);
        tracing::info!("Feature matrix: {:?}", set.features.shape());

        // ── Step 5: Config, metrics log, export strategy ──────────────────────
        // Neither side file is required; a failure only costs that file
        let metrics  = open_run_log(&cfg.output_dir, cfg);
        let strategy = ExportStrategy::resolve(cfg.export_mode, &cfg.output_dir);
        tracing::info!("Export strategy: {:?}", strategy);

        // ── Step 6: Build + fit ───────────────────────────────────────────────
        let device = training_device();
        let mut rng = StdRng::seed_from_u64(cfg.fit.seed);
        let model = TextClassifierConfig::new(vocab.embedding_rows(), TriageLabel::ALL.len())
            .with_max_len(cfg.max_len)
            .with_embedding_dim(cfg.embedding_dim)
            .with_hidden_units(cfg.hidden_units)
            .init::<TrainingBackend>(&mut rng, &device);

        let (model, history) = fit(model, &set, &cfg.fit, &device, |m| {
            if let Some(Err(e)) = metrics.as_ref().map(|log| log.log(m)) {
                tracing::warn!("Could not log epoch {}: {e:#}", m.epoch);
            }
        })?;

        // ── Step 7: Export ────────────────────────────────────────────────────
        finish_run(&model, &cfg.output_dir, strategy, set.len(), metadata, history)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_dataset(path: &std::path::Path) {
        let json = serde_json::json!([
            { "text": "Severe chest pain and shortness of breath", "label": "Urgent" },
            { "text": "Needs a routine prescription refill",       "label": "Routine" },
            { "text": "Mild headache, keep an eye on it",          "label": "Monitor" },
            { "text": "Unconscious after a fall",                  "label": "Urgent" },
            { "text": "Annual checkup booking",                    "label": "Routine" },
        ]);
        fs::write(path, serde_json::to_vec(&json).unwrap()).unwrap();
    }

    fn config(dir: &std::path::Path) -> TextTrainConfig {
        TextTrainConfig {
            dataset:    dir.join("triage.json"),
            output_dir: dir.join("out"),
            fit:        FitConfig { epochs: 2, ..FitConfig::text() },
            ..TextTrainConfig::default()
        }
    }

    #[test]
    fn test_run_writes_every_artifact() {
        let dir = tempdir().unwrap();
        write_dataset(&dir.path().join("triage.json"));
        let cfg = config(dir.path());

        let report = TrainTextUseCase::new(cfg.clone()).execute().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.examples, 5);
        assert_eq!(report.history.len(), 2);

        for file in ["metadata.json", "model.json", "weights.bin", "train_config.json", "metrics.csv"] {
            assert!(cfg.output_dir.join(file).exists(), "missing {file}");
        }
        let metrics = fs::read_to_string(cfg.output_dir.join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 3);
    }

    #[test]
    fn test_unwritable_metrics_log_does_not_stop_the_run() {
        let dir = tempdir().unwrap();
        write_dataset(&dir.path().join("triage.json"));
        let cfg = config(dir.path());
        fs::create_dir_all(cfg.output_dir.join("metrics.csv")).unwrap();

        let report = TrainTextUseCase::new(cfg.clone()).execute().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.history.len(), 2);
        assert!(cfg.output_dir.join("metrics.csv").is_dir());
        assert!(cfg.output_dir.join("weights.bin").is_file());
    }

    #[test]
    fn test_manual_mode_is_resolved_up_front() {
        let dir = tempdir().unwrap();
        write_dataset(&dir.path().join("triage.json"));
        let cfg = TextTrainConfig { export_mode: ExportMode::Manual, ..config(dir.path()) };

        let report = TrainTextUseCase::new(cfg.clone()).execute().unwrap();
        let saved = report.model.unwrap();
        assert_eq!(saved.strategy, ExportStrategy::Manual);
        assert!(saved.record.is_none());
        assert!(!cfg.output_dir.join("model.mpk").exists());
    }

    #[test]
    fn test_missing_dataset_is_fatal() {
        let dir = tempdir().unwrap();
        let err = TrainTextUseCase::new(config(dir.path())).execute().unwrap_err();
        assert!(format!("{err:#}").contains("triage.json"));
    }

    #[test]
    fn test_empty_dataset_fails_before_training() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("triage.json"), "[]").unwrap();
        let err = TrainTextUseCase::new(config(dir.path())).execute().unwrap_err();
        assert!(err.downcast_ref::<TrainingError>().is_some());
    }
}

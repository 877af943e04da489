// ============================================================
// Layer 2 — Run Report
// ============================================================
// The bookends shared by both training workflows:
//   before fit — save train_config.json and open metrics.csv
//   after fit  — export the model, then decide whether the run
//                produced anything usable
//
// A run fails only if NEITHER metadata.json NOR the model bundle
// exists at the end. Either one alone is reported with a warning;
// the config snapshot and metrics log never fail a run.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use serde::Serialize;

use crate::infra::{
    atomic::write_atomic,
    exporter::{export_with_fallback, ExportStrategy, FileSaveHandler, SavedModel},
    artifact::ExportableModel,
    metrics::MetricsLogger,
};
use crate::ml::trainer::History;

pub const CONFIG_FILE: &str = "train_config.json";

/// What a training run left in its output directory
#[derive(Debug, Clone)]
pub struct RunReport {
    pub examples: usize,
    pub metadata: Option<PathBuf>,
    pub model:    Option<SavedModel>,
    pub history:  History,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.metadata.is_some() && self.model.is_some()
    }
}

/// Persist the effective run configuration next to the artifacts
pub fn save_config<T: Serialize>(out_dir: &Path, cfg: &T) -> Result<()> {
    let path = out_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(cfg)?;
    write_atomic(&path, json.as_bytes())
        .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
    tracing::debug!("Saved training config to '{}'", path.display());
    Ok(())
}

/// Save the config snapshot and open the metrics log. Failures are
/// logged and the run carries on without the file in question.
pub fn open_run_log<T: Serialize>(out_dir: &Path, cfg: &T) -> Option<MetricsLogger> {
    if let Err(e) = save_config(out_dir, cfg) {
        tracing::warn!("Continuing without {CONFIG_FILE}: {e:#}");
    }
    match MetricsLogger::create(out_dir) {
        Ok(logger) => Some(logger),
        Err(e) => {
            tracing::warn!("Continuing without a metrics log: {e:#}");
            None
        }
    }
}

/// Export `model` and assemble the report. Export errors are
/// logged, not returned, unless metadata is missing as well.
pub fn finish_run<B, M>(
    model:    &M,
    out_dir:  &Path,
    strategy: ExportStrategy,
    examples: usize,
    metadata: Option<PathBuf>,
    history:  History,
) -> Result<RunReport>
where
    B: Backend,
    M: ExportableModel<B>,
{
    let fallback = FileSaveHandler::new(out_dir);
    let model = match export_with_fallback::<B, M, _>(model, out_dir, strategy, &fallback) {
        Ok(saved) => {
            tracing::info!(
                "Model saved ({:?}, {} parameters) to '{}'",
                saved.strategy,
                saved.parameter_count,
                saved.bundle.model_json.display(),
            );
            Some(saved)
        }
        Err(e) => {
            tracing::error!("Model export failed: {e}");
            None
        }
    };

    if metadata.is_none() && model.is_none() {
        bail!(
            "Neither metadata nor model could be written to '{}'",
            out_dir.display()
        );
    }
    if metadata.is_none() {
        tracing::warn!("Model saved but metadata.json is missing");
    }

    Ok(RunReport { examples, metadata, model, history })
}

// ============================================================
// Layer 6 — Model Exporter
// ============================================================
// Persists a trained model through one of two strategies:
//
//   Native  — burn's NamedMpkFileRecorder writes model.mpk
//             (full precision), then the portable bundle
//             (model.json + weights.bin) is written next to it.
//
//   Manual  — an injectable SaveHandler receives the raw
//             ModelArtifacts and decides where they go. The
//             default FileSaveHandler writes the same bundle.
//
// The strategy is resolved ONCE, before training starts
// (ExportMode::Auto picks Native when the output directory is
// writable). If the native path then fails, the error is caught
// here and the export is retried exactly once through the manual
// handler.
//
// Both paths serialise weights through ModelArtifacts, so the
// same weights always produce the same weights.bin bytes.
//
// Reference: Burn Book §5 (Records)

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::domain::error::ExportError;
use crate::infra::artifact::{ExportableModel, ModelArtifacts, MODEL_FILE, WEIGHTS_FILE};
use crate::infra::atomic::write_atomic;

/// Base name of the native record; the recorder appends `.mpk`
pub const RECORD_STEM: &str = "model";

// ─── Strategy selection ──────────────────────────────────────────────────────
/// What the caller asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    #[default]
    Auto,
    Native,
    Manual,
}

/// What the capability check decided, and what actually produced the files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStrategy {
    Native,
    Manual,
}

impl ExportStrategy {
    /// Resolve `mode` against the output directory. Auto selects
    /// Native only if `out_dir` exists (or can be created) and is
    /// not read-only.
    pub fn resolve(mode: ExportMode, out_dir: &Path) -> Self {
        match mode {
            ExportMode::Native => Self::Native,
            ExportMode::Manual => Self::Manual,
            ExportMode::Auto => {
                let writable = fs::create_dir_all(out_dir)
                    .and_then(|_| fs::metadata(out_dir))
                    .map(|m| m.is_dir() && !m.permissions().readonly())
                    .unwrap_or(false);
                if writable { Self::Native } else { Self::Manual }
            }
        }
    }
}

// ─── Save handlers ───────────────────────────────────────────────────────────
/// Where a bundle ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    pub model_json:  PathBuf,
    pub weights_bin: PathBuf,
}

/// Receives the manual-path artifacts.
///
/// Implemented for any `Fn(&ModelArtifacts) -> Result<BundlePaths, ExportError>`
/// so tests and callers can inject a closure.
pub trait SaveHandler {
    fn save(&self, artifacts: &ModelArtifacts) -> Result<BundlePaths, ExportError>;
}

impl<F> SaveHandler for F
where
    F: Fn(&ModelArtifacts) -> Result<BundlePaths, ExportError>,
{
    fn save(&self, artifacts: &ModelArtifacts) -> Result<BundlePaths, ExportError> {
        self(artifacts)
    }
}

/// Default handler: model.json (pretty) + weights.bin into `dir`
#[derive(Debug, Clone)]
pub struct FileSaveHandler {
    dir: PathBuf,
}

impl FileSaveHandler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveHandler for FileSaveHandler {
    fn save(&self, artifacts: &ModelArtifacts) -> Result<BundlePaths, ExportError> {
        write_bundle(&self.dir, artifacts)
    }
}

/// Write model.json and weights.bin into `dir`, each atomically
pub fn write_bundle(dir: &Path, artifacts: &ModelArtifacts) -> Result<BundlePaths, ExportError> {
    let model_json  = dir.join(MODEL_FILE);
    let weights_bin = dir.join(WEIGHTS_FILE);

    let json = serde_json::to_vec_pretty(&artifacts.model_json())?;
    write_atomic(&model_json, &json)
        .map_err(|source| ExportError::Io { path: model_json.clone(), source })?;
    write_atomic(&weights_bin, &artifacts.weight_data)
        .map_err(|source| ExportError::Io { path: weights_bin.clone(), source })?;

    tracing::debug!(
        "Wrote bundle: {} weight tensors, {} bytes",
        artifacts.weight_specs.len(),
        artifacts.weight_data.len(),
    );
    Ok(BundlePaths { model_json, weights_bin })
}

// ─── Export ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedModel {
    /// Strategy that produced the files (Manual after a fallback)
    pub strategy:        ExportStrategy,
    pub bundle:          BundlePaths,
    /// Native record, only on the native path
    pub record:          Option<PathBuf>,
    pub parameter_count: usize,
}

/// Native path: burn record + bundle
pub fn export_native<B, M>(
    model:     &M,
    artifacts: &ModelArtifacts,
    out_dir:   &Path,
) -> Result<SavedModel, ExportError>
where
    B: Backend,
    M: ExportableModel<B>,
{
    let stem = out_dir.join(RECORD_STEM);
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    Recorder::<B>::record(&recorder, model.clone().into_record(), stem.clone())
        .map_err(|e| ExportError::Record { path: stem.clone(), message: format!("{e:?}") })?;

    let bundle = write_bundle(out_dir, artifacts)?;
    Ok(SavedModel {
        strategy:        ExportStrategy::Native,
        bundle,
        record:          Some(stem.with_extension("mpk")),
        parameter_count: artifacts.parameter_count(),
    })
}

/// Manual path: hand the artifacts to `handler`
pub fn export_manual<H: SaveHandler>(
    artifacts: &ModelArtifacts,
    handler:   &H,
) -> Result<SavedModel, ExportError> {
    let bundle = handler.save(artifacts)?;
    Ok(SavedModel {
        strategy:        ExportStrategy::Manual,
        bundle,
        record:          None,
        parameter_count: artifacts.parameter_count(),
    })
}

/// Export `model` with the strategy resolved at startup; a native
/// failure switches to `fallback` once. Errors only if the strategy
/// that ran last fails.
pub fn export_with_fallback<B, M, H>(
    model:    &M,
    out_dir:  &Path,
    strategy: ExportStrategy,
    fallback: &H,
) -> Result<SavedModel, ExportError>
where
    B: Backend,
    M: ExportableModel<B>,
    H: SaveHandler,
{
    let artifacts = ModelArtifacts::from_model::<B, M>(model)?;

    match strategy {
        ExportStrategy::Manual => export_manual(&artifacts, fallback),
        ExportStrategy::Native => match export_native::<B, M>(model, &artifacts, out_dir) {
            Ok(saved) => Ok(saved),
            Err(e) => {
                tracing::warn!("Native export failed ({e}); falling back to manual save handler");
                export_manual(&artifacts, fallback)
            }
        },
    }
}

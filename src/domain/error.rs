use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the trainer before or during `fit`.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("no valid examples to train on: the feature matrix is empty")]
    EmptyDataset,
    #[error(
        "validation split {split} leaves no training examples out of {total}"
    )]
    EmptyTrainingSplit { split: f64, total: usize },
    #[error("feature matrix has {rows} rows but the label vector has {labels}")]
    LabelCountMismatch { rows: usize, labels: usize },
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
}

/// Errors raised while persisting a model bundle.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to record native model to {path}: {message}")]
    Record { path: PathBuf, message: String },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialise model.json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read weights of {name}: {message}")]
    Weights { name: String, message: String },
    #[error("save handler rejected the artifacts: {0}")]
    Handler(String),
}

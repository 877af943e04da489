// ============================================================
// Layer 4 — Dataset Loaders
// ============================================================
// Reads the two raw datasets from disk:
//
//   TextDatasetLoader → triage JSON array [{text, label}, ...]
//   SurveyLoader      → survey CSV with a header row
//
// plus DatasetLog, the append-only view of the triage JSON file
// that the generation stage grows run after run.
//
// Failure policy:
//   - missing dataset file for training  → error (fatal)
//   - present but unparseable JSON       → warning, empty dataset
//   - element with an unknown label      → warning, element skipped
//
// Reference: serde_json and csv crate documentation

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::example::{LabeledTabularExample, LabeledTextExample, TriageLabel};
use crate::domain::traits::ExampleSource;
use crate::infra::atomic::write_atomic;

/// Target column of the survey file
pub const TARGET_COLUMN: &str = "treatment";

/// Literal value of the target column that means "sought treatment"
pub const POSITIVE_TARGET: &str = "Yes";

// Label kept as a string so one bad element doesn't void the file
#[derive(Debug, Deserialize)]
struct RawTextExample {
    text:  String,
    label: String,
}

/// Parse the JSON dataset body. `None` means the content is corrupt.
fn parse_text_dataset(source: &str, content: &str) -> Option<Vec<LabeledTextExample>> {
    let raw: Vec<RawTextExample> = match serde_json::from_str(content) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Dataset '{}' is corrupted ({}) — treating it as empty", source, e);
            return None;
        }
    };

    let total = raw.len();
    let examples: Vec<LabeledTextExample> = raw
        .into_iter()
        .filter_map(|r| TriageLabel::parse(&r.label).map(|label| LabeledTextExample::new(r.text, label)))
        .collect();

    if examples.len() < total {
        tracing::warn!(
            "Skipped {} examples with an unknown label in '{}'",
            total - examples.len(),
            source
        );
    }
    Some(examples)
}

// ─── TextDatasetLoader ───────────────────────────────────────────────────────
/// Loads the triage dataset for a training run
pub struct TextDatasetLoader {
    path: PathBuf,
}

impl TextDatasetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for TextDatasetLoader {
    type Example = LabeledTextExample;

    fn load_all(&self) -> Result<Vec<LabeledTextExample>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let examples = parse_text_dataset(&self.path.display().to_string(), &content)
            .unwrap_or_default();
        tracing::info!("Loaded {} triage examples from '{}'", examples.len(), self.path.display());
        Ok(examples)
    }
}

// ─── SurveyLoader ────────────────────────────────────────────────────────────
/// Loads the mental-health survey CSV.
///
/// Every column of a row is kept; the assembler picks the ones the
/// layout names. Rows keep file order, which fixes the categorical ids.
pub struct SurveyLoader {
    path: PathBuf,
}

impl SurveyLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for SurveyLoader {
    type Example = LabeledTabularExample;

    fn load_all(&self) -> Result<Vec<LabeledTabularExample>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot read survey '{}'", self.path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Cannot read header row of '{}'", self.path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        if !headers.iter().any(|h| h == TARGET_COLUMN) {
            tracing::warn!(
                "Survey '{}' has no '{}' column — every row is a negative example",
                self.path.display(),
                TARGET_COLUMN
            );
        }

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!("Malformed CSV record {} in '{}'", line + 2, self.path.display())
            })?;

            let features: HashMap<String, String> = headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();
            let target = features.get(TARGET_COLUMN).map(String::as_str) == Some(POSITIVE_TARGET);
            rows.push(LabeledTabularExample::new(features, target));
        }

        tracing::info!("Loaded {} survey rows from '{}'", rows.len(), self.path.display());
        Ok(rows)
    }
}

// ─── DatasetLog ──────────────────────────────────────────────────────────────
/// The triage dataset seen as an append-only log.
///
/// `append` is load → merge → save, and the save goes through a
/// temporary file plus rename, so an interrupted run leaves either
/// the old file or the new one, never half of it.
pub struct DatasetLog {
    path: PathBuf,
}

impl DatasetLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current content; missing or corrupted files read as empty
    pub fn load(&self) -> Vec<LabeledTextExample> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                parse_text_dataset(&self.path.display().to_string(), &content).unwrap_or_default()
            }
            Err(e) => {
                tracing::info!(
                    "Dataset '{}' not readable ({}) — starting from an empty log",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Append `examples` after the existing ones and persist.
    /// Returns the total number of examples now in the log.
    pub fn append(&self, examples: &[LabeledTextExample]) -> Result<usize> {
        let mut merged = self.load();
        merged.extend_from_slice(examples);

        let json = serde_json::to_string_pretty(&merged)?;
        write_atomic(&self.path, json.as_bytes())
            .with_context(|| format!("Cannot write dataset '{}'", self.path.display()))?;

        tracing::info!(
            "Appended {} examples to '{}' ({} total)",
            examples.len(),
            self.path.display(),
            merged.len()
        );
        Ok(merged.len())
    }
}

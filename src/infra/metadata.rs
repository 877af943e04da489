// ============================================================
// Layer 6 — Preprocessing Metadata
// ============================================================
// metadata.json tells the inference runtime how to turn raw input
// into exactly the vector the model was trained on.
//
//   text:    { "wordIndex": {token: id}, "maxLen": 20,
//              "classes": ["Urgent", "Routine", "Monitor"] }
//
//   tabular: { "features": ["Age", "Gender", ...],
//              "mappings": {feature: {value: id}},
//              "inputShape": [width] }
//
// It is written before training starts and independently of the
// model export, so a failed model save still leaves usable metadata.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::{assembler::TabularLayout, encoder::CategoricalEncoder, vocabulary::Vocabulary};
use crate::domain::{error::ExportError, example::TriageLabel};
use crate::infra::atomic::write_atomic;

pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMetadata<'a> {
    pub word_index: &'a Vocabulary,
    pub max_len:    usize,
    pub classes:    Vec<String>,
}

impl<'a> TextMetadata<'a> {
    pub fn new(vocab: &'a Vocabulary, max_len: usize) -> Self {
        Self { word_index: vocab, max_len, classes: TriageLabel::class_names() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabularMetadata<'a> {
    pub features:    Vec<String>,
    pub mappings:    &'a CategoricalEncoder,
    pub input_shape: [usize; 1],
}

impl<'a> TabularMetadata<'a> {
    pub fn new(layout: &TabularLayout, encoder: &'a CategoricalEncoder) -> Self {
        Self {
            features:    layout.feature_names(),
            mappings:    encoder,
            input_shape: [layout.width()],
        }
    }
}

/// Write `metadata` as pretty JSON to `<out_dir>/metadata.json`
pub fn write_metadata<T: Serialize>(out_dir: &Path, metadata: &T) -> Result<PathBuf, ExportError> {
    let path = out_dir.join(METADATA_FILE);
    let json = serde_json::to_vec_pretty(metadata)?;
    write_atomic(&path, &json).map_err(|source| ExportError::Io { path: path.clone(), source })?;
    tracing::info!("Metadata written to '{}'", path.display());
    Ok(path)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::LabeledTextExample;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[test]
    fn test_text_metadata_layout() {
        let vocab = Vocabulary::build(&[
            LabeledTextExample::new("severe chest pain", TriageLabel::Urgent),
        ]);
        let value = serde_json::to_value(TextMetadata::new(&vocab, 20)).unwrap();
        assert_eq!(value, json!({
            "wordIndex": { "chest": 1, "pain": 2, "severe": 3 },
            "maxLen": 20,
            "classes": ["Urgent", "Routine", "Monitor"],
        }));
    }

    #[test]
    fn test_tabular_metadata_matches_input_width() {
        let layout = TabularLayout::new(["family_history", "remote_work"]);
        let mut encoder = CategoricalEncoder::new();
        encoder.encode("family_history", Some("No"));
        encoder.encode("remote_work", None);
        encoder.encode("family_history", Some("Yes"));

        let dir  = tempdir().unwrap();
        let path = write_metadata(dir.path(), &TabularMetadata::new(&layout, &encoder)).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["features"], json!(["Age", "Gender", "family_history", "remote_work"]));
        assert_eq!(value["inputShape"], json!([4]));
        assert_eq!(value["mappings"]["family_history"], json!({ "No": 0, "Yes": 1 }));
        assert_eq!(value["mappings"]["remote_work"], json!({ "NA": 0 }));

        // mapping keys keep first-seen order in the file itself
        assert!(text.find("\"No\"").unwrap() < text.find("\"Yes\"").unwrap());
    }
}

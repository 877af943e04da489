// ============================================================
// Layer 4 — Feature Assembler
// ============================================================
// Converts every example into a fixed-width numeric row.
//
// Text path:
//   "sharp chest pain" → [sharp, chest, pain]      (tokenize)
//                      → [7, 1, 5]                 (vocabulary)
//                      → [7, 1, 5, 0, 0, ... 0]    (pad to MAX_LEN)
//
// Tabular path (age filter first, bad rows skipped):
//   [ (age-18)/82, gender, encode(f1), encode(f2), ... ]
//
// Width and column order of both layouts are written to the
// metadata, so the inference runtime can rebuild the same rows.

use crate::data::dataset::{FeatureMatrix, TrainingSet};
use crate::data::encoder::{gender_code, normalize_age, parse_age, CategoricalEncoder};
use crate::data::tokenizer::tokenize;
use crate::data::vocabulary::{Vocabulary, PAD_ID};
use crate::domain::example::{LabeledTabularExample, LabeledTextExample};

/// Fixed token-sequence length of the triage model
pub const MAX_LEN: usize = 20;

/// Column holding the respondent's age
pub const AGE_COLUMN: &str = "Age";

/// Column holding the free-text gender answer
pub const GENDER_COLUMN: &str = "Gender";

// ─── Text ─────────────────────────────────────────────────────────────────────
/// Token ids of `text`, truncated and right-padded to exactly `max_len`
pub fn encode_text(text: &str, vocab: &Vocabulary, max_len: usize) -> Vec<u32> {
    let mut ids: Vec<u32> = tokenize(text)
        .iter()
        .take(max_len)
        .map(|t| vocab.lookup(t))
        .collect();
    ids.resize(max_len, PAD_ID);
    ids
}

/// Vectorise the whole triage corpus
pub fn assemble_text(
    examples: &[LabeledTextExample],
    vocab:    &Vocabulary,
    max_len:  usize,
) -> TrainingSet {
    let mut features = FeatureMatrix::new(max_len);
    let mut labels   = Vec::with_capacity(examples.len());

    for ex in examples {
        let row: Vec<f32> = encode_text(&ex.text, vocab, max_len)
            .into_iter()
            .map(|id| id as f32)
            .collect();
        features.push_row(&row);
        labels.push(ex.label.index());
    }

    TrainingSet { features, labels }
}

// ─── Tabular ──────────────────────────────────────────────────────────────────
/// Column layout of the tabular feature vector.
///
/// Age and gender always lead; the categorical columns follow in
/// the configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularLayout {
    categorical: Vec<String>,
}

impl TabularLayout {
    pub fn new<S: Into<String>>(categorical: impl IntoIterator<Item = S>) -> Self {
        Self { categorical: categorical.into_iter().map(Into::into).collect() }
    }

    /// Full ordered feature-name list, as persisted in metadata
    pub fn feature_names(&self) -> Vec<String> {
        [AGE_COLUMN.to_string(), GENDER_COLUMN.to_string()]
            .into_iter()
            .chain(self.categorical.iter().cloned())
            .collect()
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// Length of one feature vector
    pub fn width(&self) -> usize {
        2 + self.categorical.len()
    }
}

/// Vector for one survey row, or `None` when the age filter rejects it.
/// Only rows that pass the filter touch the encoder.
pub fn encode_row(
    row:     &LabeledTabularExample,
    layout:  &TabularLayout,
    encoder: &mut CategoricalEncoder,
) -> Option<Vec<f32>> {
    let age = parse_age(row.feature(AGE_COLUMN)?)?;

    let mut vector = Vec::with_capacity(layout.width());
    vector.push(normalize_age(age));
    vector.push(gender_code(row.feature(GENDER_COLUMN)));
    for name in layout.categorical() {
        vector.push(encoder.encode(name, row.feature(name)) as f32);
    }
    Some(vector)
}

/// Vectorise the survey in row order, skipping rows with an invalid age
pub fn assemble_tabular(
    rows:    &[LabeledTabularExample],
    layout:  &TabularLayout,
    encoder: &mut CategoricalEncoder,
) -> TrainingSet {
    let mut features = FeatureMatrix::new(layout.width());
    let mut labels   = Vec::new();

    for row in rows {
        if let Some(vector) = encode_row(row, layout, encoder) {
            features.push_row(&vector);
            labels.push(row.target_index());
        }
    }

    tracing::debug!(
        "Assembled {} of {} survey rows ({} dropped by the age filter)",
        labels.len(),
        rows.len(),
        rows.len() - labels.len(),
    );

    TrainingSet { features, labels }
}

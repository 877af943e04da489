// ============================================================
// Layer 4 — Vocabulary Builder
// ============================================================
// Assigns every distinct token of the triage corpus a stable
// integer id.
//
//   1. Tokenize every example
//   2. Union all tokens into a sorted set
//   3. Assign ids 1..=N in sorted order
//
// Id 0 is never given to a real token: it is both the padding
// value and the id of any token the vocabulary has not seen.
// Sorting before assigning makes the result independent of the
// order examples appear in, so two runs over the same corpus
// always produce the same wordIndex.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::tokenizer::tokenize;
use crate::domain::example::LabeledTextExample;

/// Padding / unknown-token sentinel id
pub const PAD_ID: u32 = 0;

/// Token → id table, serialised as the `wordIndex` object of the
/// text metadata. Backed by a BTreeMap so the JSON keys come out
/// sorted, which is also id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    word_index: BTreeMap<String, u32>,
}

impl Vocabulary {
    /// Build the vocabulary from a corpus of labelled examples
    pub fn build(examples: &[LabeledTextExample]) -> Self {
        let tokens: BTreeSet<String> = examples
            .iter()
            .flat_map(|ex| tokenize(&ex.text))
            .collect();

        // BTreeSet iterates in sorted order; ids start at 1
        let word_index = tokens
            .into_iter()
            .zip(1u32..)
            .collect();

        Self { word_index }
    }

    /// Id of `token`, or `PAD_ID` when it was never seen
    pub fn lookup(&self, token: &str) -> u32 {
        self.word_index.get(token).copied().unwrap_or(PAD_ID)
    }

    /// Number of real tokens (excludes the padding row)
    pub fn len(&self) -> usize {
        self.word_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_index.is_empty()
    }

    /// Rows the embedding layer needs: every real token plus id 0
    pub fn embedding_rows(&self) -> usize {
        self.len() + 1
    }

    pub fn word_index(&self) -> &BTreeMap<String, u32> {
        &self.word_index
    }
}

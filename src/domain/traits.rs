// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams other layers implement:
//
//   ExampleSource    — anything that yields labelled examples
//                      (JSON triage log, survey CSV, test fixtures)
//   ExampleGenerator — the external generative-text service used
//                      to grow the triage dataset
//
// The application layer only sees these traits, so the file
// formats and the network client can be swapped without touching
// the training workflow.

use anyhow::Result;

use crate::domain::example::{LabeledTextExample, TriageLabel};

// ─── ExampleSource ───────────────────────────────────────────────────────────
/// Any component that can load a full set of training examples.
///
/// Implementations:
///   - TextDatasetLoader  → JSON array of `{text, label}`
///   - SurveyLoader       → CSV with a header row
pub trait ExampleSource {
    type Example;

    /// Load every example in source order.
    /// Order matters for the tabular encoder, so implementations
    /// must not reorder rows.
    fn load_all(&self) -> Result<Vec<Self::Example>>;
}

// ─── ExampleGenerator ────────────────────────────────────────────────────────
/// One request to the generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationBatch {
    pub label: TriageLabel,
    pub count: usize,
}

/// The external generative-text collaborator.
///
/// Each call is one network request; failures are retried by
/// `GenerationStage`, never inside the implementation.
pub trait ExampleGenerator {
    fn generate(&mut self, batch: &GenerationBatch) -> Result<Vec<LabeledTextExample>>;
}

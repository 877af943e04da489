// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw dataset files all the
// way to tensor batches.
//
// The pipeline flows in this order:
//
//   triage.json / survey.csv
//       │
//       ▼
//   Loaders           → read files, keep source row order
//       │
//       ▼
//   Tokenizer         → normalised word tokens (text only)
//       │
//       ▼
//   Vocabulary /      → token ids (sorted) or categorical ids
//   CategoricalEncoder  (first-seen order)
//       │
//       ▼
//   Assembler         → fixed-width feature matrix + labels
//       │
//       ▼
//   Splitter          → trailing validation split
//       │
//       ▼
//   FeatureDataset    → burn Dataset of FeatureRows per split
//       │
//       ▼
//   FeatureBatcher    → burn Batcher, stacks rows into tensors
//
// Each module is responsible for exactly one step.

/// Reads the triage JSON, the survey CSV and the append-only log
pub mod loader;

/// Lower-case, strip, split and filter free text
pub mod tokenizer;

/// Sorted token → id table
pub mod vocabulary;

/// Per-feature first-seen encoders plus the age/gender rules
pub mod encoder;

/// Turns examples into fixed-width rows
pub mod assembler;

/// Feature matrix, training set and the burn `Dataset` views
pub mod dataset;

/// Burn `Batcher` from rows to tensor batches
pub mod batcher;

/// Trailing train/validation split and seeded shuffling
pub mod splitter;

// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the output directory:
//
//   atomic.rs    — temp-file-then-rename writes, shared by the
//                  dataset log and every artifact file
//
//   artifact.rs  — the portable layers-model bundle: topology
//                  JSON, weight specs and the weights.bin buffer
//
//   exporter.rs  — native (burn record) and manual (injectable
//                  save handler) export strategies, with a
//                  single fallback from native to manual
//
//   metadata.rs  — metadata.json for the inference runtime
//
//   metrics.rs   — per-epoch metrics CSV
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Records)

/// Atomic file replacement
pub mod atomic;

/// Layers-model bundle types and topology builders
pub mod artifact;

/// Export strategies and fallback
pub mod exporter;

/// Preprocessing metadata for inference
pub mod metadata;

/// Training metrics CSV logger
pub mod metrics;

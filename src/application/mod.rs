// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per use case (train a model, grow the dataset).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - No file formats here (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The triage text classifier workflow
pub mod train_text_use_case;

// The mental-health risk classifier workflow
pub mod train_tabular_use_case;

// Export + run outcome shared by both workflows
pub mod report;

// Retry contract around the external example generator
pub mod generation;

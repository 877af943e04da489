// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// pipeline works on.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, traits and error types

// Labelled text and tabular examples
pub mod example;

// Core abstractions (traits) that other layers implement
pub mod traits;

// Typed failures of the training and export seams
pub mod error;

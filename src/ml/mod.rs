// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Model definitions and the training loop.
//
//   model.rs     — the two classifiers
//                  • triage text: Embedding → average pooling
//                    → Dense(relu) → Dense(3)
//                  • mental-health risk: Dense(16, relu)
//                    → Dropout(0.2) → Dense(8, relu) → Dense(2)
//                  Seeded initialisation, so two runs with the
//                  same seed start from identical weights.
//
//   trainer.rs   — mini-batch fit loop with a trailing
//                  validation split and per-epoch metrics
//
// Training runs on the ndarray CPU backend: results are
// reproducible bit for bit across runs on the same machine.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

/// Classifier architectures
pub mod model;

/// Fit loop with validation
pub mod trainer;

pub type TrainingBackend = Autodiff<NdArray>;

pub fn training_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

// ============================================================
// Layer 4 — Feature Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<FeatureRow>
// into tensors on the device the DataLoader hands over.
//
// How batching works here:
//   Input:  N FeatureRows, each W features wide
//   Output: ClassificationBatch with
//             features: [N, W] float tensor
//             labels:   [N]    int tensor (class index)
//
// We flatten all rows into one Vec, then reshape:
//   [r1_f1, r1_f2, ..., r1_fW, r2_f1, ..., rN_fW] → [N, W]
//
// All rows are already fixed-width (padded by the assembler),
// so no dynamic padding happens here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::FeatureRow;

// ─── ClassificationBatch ─────────────────────────────────────────────────────
/// A batch ready for the model forward pass.
///
/// B is the Burn Backend (e.g. Autodiff<NdArray>, NdArray) —
/// generic so the same batcher serves training and validation.
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Shape: [batch_size, width]
    pub features: Tensor<B, 2>,

    /// Shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> ClassificationBatch<B> {
    pub fn len(&self) -> usize {
        self.labels.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── FeatureBatcher ──────────────────────────────────────────────────────────
/// Stateless: the DataLoader passes the target device on every call,
/// so one batcher serves the autodiff and the inner backend alike.
#[derive(Clone, Debug, Default)]
pub struct FeatureBatcher;

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// The DataLoader calls .batch(items, device) with each mini-batch of rows.
impl<B: Backend> Batcher<B, FeatureRow, ClassificationBatch<B>> for FeatureBatcher {
    fn batch(&self, items: Vec<FeatureRow>, device: &B::Device) -> ClassificationBatch<B> {
        let batch_size = items.len();
        let width      = items.first().map_or(0, |row| row.features.len());

        // ── Flatten rows ──────────────────────────────────────────────────────
        let features_flat: Vec<f32> = items
            .iter()
            .flat_map(|row| row.features.iter().copied())
            .collect();

        // ── Collect class indices ─────────────────────────────────────────────
        // Burn Int tensors are built from i32 slices
        let labels: Vec<i32> = items.iter().map(|row| row.label as i32).collect();

        let features = Tensor::<B, 1>::from_floats(features_flat.as_slice(), device)
            .reshape([batch_size, width]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), device);

        ClassificationBatch { features, labels }
    }
}

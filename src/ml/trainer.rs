// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Mini-batch train + validation loop with Adam.
//
// Key Burn 0.20 insight:
//   - Training runs on an AutodiffBackend for gradients
//   - model.valid() returns the model on B::InnerBackend, so
//     validation builds its batches on the inner backend too
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Data flows through Burn's DataLoader:
//   TrainingSet → FeatureDataset (Dataset trait) →
// FeatureBatcher (Batcher trait) → ClassificationBatch.
//
// Determinism: a StdRng seeded from FitConfig::seed drives the
// initial shuffle and the dropout masks. The training loader owns
// a second RNG (same seed) that reshuffles it on every pass.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::{ClassificationBatch, FeatureBatcher},
    dataset::{FeatureDataset, TrainingSet},
    splitter::{shuffle_with, split_trailing},
};
use crate::domain::error::TrainingError;
use crate::ml::model::ClassifierModel;

// ─── FitConfig ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    pub epochs:           usize,
    pub batch_size:       usize,
    pub validation_split: f64,
    pub shuffle:          bool,
    pub learning_rate:    f64,
    pub seed:             u64,
}

impl FitConfig {
    /// Triage text classifier defaults
    pub fn text() -> Self {
        Self {
            epochs:           30,
            batch_size:       4,
            validation_split: 0.2,
            shuffle:          true,
            learning_rate:    1e-3,
            seed:             42,
        }
    }

    /// Mental-health risk classifier defaults
    pub fn tabular() -> Self {
        Self {
            epochs:           50,
            batch_size:       32,
            validation_split: 0.2,
            shuffle:          true,
            learning_rate:    1e-3,
            seed:             42,
        }
    }
}

// ─── History ─────────────────────────────────────────────────────────────────
/// Metrics reported after one epoch. Validation values are `None`
/// when the split leaves no validation example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:        usize,
    pub loss:         f64,
    pub accuracy:     f64,
    pub val_loss:     Option<f64>,
    pub val_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochMetrics>,
}

impl History {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

/// Sample-weighted loss and accuracy over a set of rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
}

#[derive(Default)]
struct Accumulator {
    loss_sum: f64,
    correct:  usize,
    samples:  usize,
}

impl Accumulator {
    fn add<B: Backend>(&mut self, logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>, batch_loss: f64) {
        let n = labels.dims()[0];
        let correct: i64 = logits
            .argmax(1)
            .flatten::<1>(0, 1)
            .equal(labels)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        self.loss_sum += batch_loss * n as f64;
        self.correct  += correct as usize;
        self.samples  += n;
    }

    fn finish(&self) -> Evaluation {
        if self.samples == 0 {
            return Evaluation { loss: f64::NAN, accuracy: 0.0 };
        }
        Evaluation {
            loss:     self.loss_sum / self.samples as f64,
            accuracy: self.correct as f64 / self.samples as f64,
        }
    }
}

fn validate_inputs(set: &TrainingSet, cfg: &FitConfig) -> Result<(), TrainingError> {
    if set.features.is_empty() || set.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }
    if set.features.rows() != set.len() {
        return Err(TrainingError::LabelCountMismatch {
            rows:   set.features.rows(),
            labels: set.len(),
        });
    }
    if cfg.batch_size == 0 {
        return Err(TrainingError::ZeroBatchSize);
    }
    Ok(())
}

/// Mini-batch loader over `dataset` on `device`. With `shuffle` set the
/// order is reshuffled from that seed on every pass.
pub fn build_loader<B: Backend>(
    dataset:    FeatureDataset,
    batch_size: usize,
    shuffle:    Option<u64>,
    device:     &B::Device,
) -> Arc<dyn DataLoader<B, ClassificationBatch<B>>> {
    let builder = DataLoaderBuilder::new(FeatureBatcher)
        .batch_size(batch_size.max(1))
        .set_device(device.clone());
    let builder = match shuffle {
        Some(seed) => builder.shuffle(seed),
        None       => builder,
    };
    builder.build(dataset)
}

// ─── fit ─────────────────────────────────────────────────────────────────────
/// Train `model` on `set` and return it with the per-epoch history.
///
/// `on_epoch` is called once per epoch, after validation. There is no
/// early stopping: every configured epoch runs.
pub fn fit<B, M>(
    mut model: M,
    set:       &TrainingSet,
    cfg:       &FitConfig,
    device:    &B::Device,
    mut on_epoch: impl FnMut(&EpochMetrics),
) -> Result<(M, History), TrainingError>
where
    B: AutodiffBackend,
    M: ClassifierModel<B> + AutodiffModule<B>,
    M::InnerModule: ClassifierModel<B::InnerBackend>,
{
    validate_inputs(set, cfg)?;

    let mut rng = StdRng::seed_from_u64(cfg.seed);

    // ── Train / validation split ──────────────────────────────────────────────
    let mut indices: Vec<usize> = (0..set.len()).collect();
    if cfg.shuffle {
        shuffle_with(&mut indices, &mut rng);
    }
    let (train_idx, val_idx) = split_trailing(indices, cfg.validation_split);
    if train_idx.is_empty() {
        return Err(TrainingError::EmptyTrainingSplit {
            split: cfg.validation_split,
            total: set.len(),
        });
    }
    tracing::info!(
        "Training on {} examples, validating on {} ({} epochs, batch size {})",
        train_idx.len(), val_idx.len(), cfg.epochs, cfg.batch_size,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    // Validation batches live on the inner backend, like model.valid()
    let train_loader = build_loader::<B>(
        set.select(&train_idx),
        cfg.batch_size,
        cfg.shuffle.then_some(cfg.seed),
        device,
    );
    let val_loader = (!val_idx.is_empty()).then(|| {
        build_loader::<B::InnerBackend>(set.select(&val_idx), cfg.batch_size, None, device)
    });

    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let mut history = History::default();

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut acc = Accumulator::default();
        for batch in train_loader.iter() {
            let logits = model.forward_logits(batch.features, Some(&mut rng));
            let loss   = loss_fn.forward(logits.clone(), batch.labels.clone());

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            acc.add(logits, batch.labels, loss_val);

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }
        let train = acc.finish();

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → inner backend, dropout disabled
        let val = val_loader
            .as_ref()
            .map(|loader| evaluate(&model.valid(), &**loader, device));

        let metrics = EpochMetrics {
            epoch,
            loss:         train.loss,
            accuracy:     train.accuracy,
            val_loss:     val.map(|v| v.loss),
            val_accuracy: val.map(|v| v.accuracy),
        };
        match (metrics.val_loss, metrics.val_accuracy) {
            (Some(vl), Some(va)) => tracing::info!(
                "Epoch {:>3}/{} | loss={:.4} | acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
                epoch, cfg.epochs, metrics.loss, metrics.accuracy * 100.0, vl, va * 100.0,
            ),
            _ => tracing::info!(
                "Epoch {:>3}/{} | loss={:.4} | acc={:.1}%",
                epoch, cfg.epochs, metrics.loss, metrics.accuracy * 100.0,
            ),
        }
        on_epoch(&metrics);
        history.epochs.push(metrics);
    }

    tracing::info!("Training complete!");
    Ok((model, history))
}

/// Loss and accuracy of `model` over every batch `loader` yields,
/// without dropout and without gradients.
pub fn evaluate<B, M>(
    model:  &M,
    loader: &dyn DataLoader<B, ClassificationBatch<B>>,
    device: &B::Device,
) -> Evaluation
where
    B: Backend,
    M: ClassifierModel<B>,
{
    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let mut acc = Accumulator::default();

    for batch in loader.iter() {
        let logits = model.forward_logits(batch.features, None);
        let loss: f64 = loss_fn
            .forward(logits.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();
        acc.add(logits, batch.labels, loss);
    }
    acc.finish()
}

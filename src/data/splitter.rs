// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Carves a held-out validation set off the END of the examples:
//   - Training set:   used to update model weights
//   - Validation set: only used to report metrics per epoch
//
// The split is trailing, not random. If the caller wants a random
// split it shuffles first (with a seeded RNG so runs repeat):
//
//   [0 1 2 3 4 5 6 7 8 9]  validation_split = 0.2
//    └──── train ────┘└val┘
//
// split_at = floor(n * (1 - validation_split))
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom};

/// Split `samples` into (train, validation), validation being the
/// trailing `validation_split` fraction.
///
/// # Example
/// ```
/// use clinic_trainer::data::splitter::split_trailing;
///
/// let (train, val) = split_trailing((0..10).collect::<Vec<_>>(), 0.2);
/// assert_eq!(train, vec![0, 1, 2, 3, 4, 5, 6, 7]);
/// assert_eq!(val, vec![8, 9]);
/// ```
pub fn split_trailing<T>(mut samples: Vec<T>, validation_split: f64) -> (Vec<T>, Vec<T>) {
    let total    = samples.len();
    let fraction = validation_split.clamp(0.0, 1.0);
    let split_at = ((total as f64) * (1.0 - fraction)).floor() as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

/// Shuffle in place with the caller's seeded RNG
pub fn shuffle_with<T>(samples: &mut [T], rng: &mut StdRng) {
    samples.shuffle(rng);
}

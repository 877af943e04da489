// ============================================================
// Layer 2 — Generation Stage
// ============================================================
// Grows the triage dataset through an external generative-text
// service, one batch per request:
//
//   for each batch:
//       attempt 1 ──fail──▶ sleep 2s ──▶ attempt 2 ──fail──▶ sleep 4s
//                                                       ──▶ attempt 3
//       success → keep examples (in order)
//       3 failures → skip the batch, log the full error once
//       sleep 2s before the next batch (rate limit)
//
// The service itself sits behind `ExampleGenerator`; sleeping sits
// behind `Sleeper`, so tests run instantly.

use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::data::loader::DatasetLog;
use crate::domain::{
    example::LabeledTextExample,
    traits::{ExampleGenerator, GenerationBatch},
};

// ─── RetryPolicy ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts:      u32,
    /// Delay after failed attempt `n` is `backoff_step × n`
    pub backoff_step:      Duration,
    pub inter_batch_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts:      3,
            backoff_step:      Duration::from_millis(2000),
            inter_batch_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

// ─── Sleeper ─────────────────────────────────────────────────────────────────
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl<F: FnMut(Duration)> Sleeper for F {
    fn sleep(&mut self, duration: Duration) {
        self(duration)
    }
}

// ─── GenerationStage ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// Successful examples, in batch order
    pub examples: Vec<LabeledTextExample>,
    pub skipped:  Vec<GenerationBatch>,
}

pub struct GenerationStage<G, S = ThreadSleeper> {
    generator: G,
    sleeper:   S,
    policy:    RetryPolicy,
}

impl<G: ExampleGenerator> GenerationStage<G> {
    pub fn new(generator: G) -> Self {
        Self::with_sleeper(generator, ThreadSleeper, RetryPolicy::default())
    }
}

impl<G: ExampleGenerator, S: Sleeper> GenerationStage<G, S> {
    pub fn with_sleeper(generator: G, sleeper: S, policy: RetryPolicy) -> Self {
        Self { generator, sleeper, policy }
    }

    /// Run every batch in order. Never fails: exhausted batches are
    /// recorded in `skipped`.
    pub fn run(&mut self, batches: &[GenerationBatch]) -> GenerationReport {
        let mut report = GenerationReport::default();

        for (i, batch) in batches.iter().enumerate() {
            if i > 0 {
                self.sleeper.sleep(self.policy.inter_batch_delay);
            }
            match self.run_batch(batch) {
                Some(examples) => {
                    tracing::info!(
                        "Batch {}/{}: {} {} examples",
                        i + 1, batches.len(), examples.len(), batch.label,
                    );
                    report.examples.extend(examples);
                }
                None => report.skipped.push(*batch),
            }
        }

        if !report.skipped.is_empty() {
            tracing::warn!("{} of {} batches skipped", report.skipped.len(), batches.len());
        }
        report
    }

    /// Run the batches and append what they produced to `log`
    pub fn run_and_append(&mut self, batches: &[GenerationBatch], log: &DatasetLog) -> Result<GenerationReport> {
        let report = self.run(batches);
        if !report.examples.is_empty() {
            log.append(&report.examples)?;
        }
        Ok(report)
    }

    fn run_batch(&mut self, batch: &GenerationBatch) -> Option<Vec<LabeledTextExample>> {
        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.generator.generate(batch) {
                Ok(examples) => return Some(examples),
                Err(e) if attempt == max_attempts => {
                    tracing::error!(
                        "Giving up on {} × {} after {} attempts: {:#}",
                        batch.count, batch.label, attempt, e,
                    );
                }
                Err(_) => {
                    let delay = self.policy.backoff(attempt);
                    tracing::debug!("Attempt {} failed, retrying in {:?}", attempt, delay);
                    self.sleeper.sleep(delay);
                }
            }
        }
        None
    }
}

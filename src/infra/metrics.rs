// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:        the epoch number (1, 2, 3, ...)
//   - loss:         sample-weighted cross-entropy on the training split
//   - accuracy:     fraction of training examples predicted correctly
//   - val_loss:     same on the validation split (empty if none)
//   - val_accuracy: same on the validation split (empty if none)
//
// Output file: <output_dir>/metrics.csv, truncated at the start of
// every run so each file describes exactly one run.
//
// Example CSV output:
//   epoch,loss,accuracy,val_loss,val_accuracy
//   1,1.098600,0.333333,1.097100,0.500000
//   2,1.091200,0.500000,1.094800,0.500000
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::trainer::EpochMetrics;

pub const METRICS_FILE: &str = "metrics.csv";

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `<dir>/metrics.csv` with just the header row
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let csv_path = dir.join(METRICS_FILE);
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,loss,accuracy,val_loss,val_accuracy")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
        writeln!(
            f,
            "{},{:.6},{:.6},{},{}",
            m.epoch,
            m.loss,
            m.accuracy,
            opt(m.val_loss),
            opt(m.val_accuracy),
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn metrics(epoch: usize, val: Option<f64>) -> EpochMetrics {
        EpochMetrics { epoch, loss: 0.5, accuracy: 0.75, val_loss: val, val_accuracy: val }
    }

    #[test]
    fn test_rows_follow_header() {
        let dir    = tempdir().unwrap();
        let logger = MetricsLogger::create(dir.path()).unwrap();
        logger.log(&metrics(1, Some(0.25))).unwrap();
        logger.log(&metrics(2, None)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            "epoch,loss,accuracy,val_loss,val_accuracy",
            "1,0.500000,0.750000,0.250000,0.250000",
            "2,0.500000,0.750000,,",
        ]);
    }

    #[test]
    fn test_create_truncates_previous_run() {
        let dir = tempdir().unwrap();
        MetricsLogger::create(dir.path()).unwrap().log(&metrics(1, None)).unwrap();
        let logger = MetricsLogger::create(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(logger.csv_path()).unwrap().lines().count(), 1);
    }
}

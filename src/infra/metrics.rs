// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends the loss of every training step to a CSV file.
//
// Output file: {model_dir}/metrics.csv
//
//   step,loss
//   1,0.811234
//   2,0.809871
//   ...
//
// The header is only written when the file is new, so repeated
// runs into the same directory keep appending.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics for a single optimiser step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepMetrics {
    /// 1-based step number
    pub step: usize,

    /// Mean sigmoid cross-entropy of the step's batch
    pub loss: f64,
}

impl StepMetrics {
    pub fn new(step: usize, loss: f64) -> Self {
        Self { step, loss }
    }
}

/// Logs step metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "step,loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one step's metrics as a new row in the CSV.
    pub fn log(&self, m: &StepMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{:.6}", m.step, m.loss)?;
        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().to_str().unwrap()).unwrap();
        logger.log(&StepMetrics::new(1, 0.75)).unwrap();
        logger.log(&StepMetrics::new(2, 0.5)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["step,loss", "1,0.750000", "2,0.500000"]);
    }

    #[test]
    fn test_reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        MetricsLogger::new(path).unwrap().log(&StepMetrics::new(1, 0.1)).unwrap();

        let logger = MetricsLogger::new(path).unwrap();
        logger.log(&StepMetrics::new(2, 0.2)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}

// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Output file: <run dir>/metrics.csv
//
//   epoch,lr,train_loss,train_acc,val_loss,val_acc
//   1,0.100000,1.712345,0.372100,1.401200,0.489300
//   2,0.100000,1.201100,0.566200,1.150300,0.594500
//   ...
//
// A fresh run starts the file over. A resumed run keeps the rows
// up to the epoch it resumes from and appends after them, so rows
// logged past the last checkpoint are not duplicated.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics for a single epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number
    pub epoch:      usize,
    pub lr:         f64,
    pub train_loss: f64,
    /// Fraction of training samples classified correctly (0.0 – 1.0)
    pub train_acc:  f64,
    pub val_loss:   f64,
    pub val_acc:    f64,
}

impl EpochMetrics {
    /// True if this epoch beats the best validation accuracy so far.
    pub fn is_improvement(&self, best_val_acc: f64) -> bool {
        self.val_acc > best_val_acc
    }
}

pub const CSV_HEADER: &str = "epoch,lr,train_loss,train_acc,val_loss,val_acc";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open `<dir>/metrics.csv`, keeping only the rows of epochs
    /// `1..=keep_through`. With `keep_through == 0` the file is rewritten
    /// with just the header.
    pub fn new(dir: impl AsRef<Path>, keep_through: usize) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        let kept: Vec<String> = if keep_through > 0 && csv_path.exists() {
            fs::read_to_string(&csv_path)
                .with_context(|| format!("Cannot read '{}'", csv_path.display()))?
                .lines()
                .skip(1)
                .filter(|line| row_epoch(line).is_some_and(|e| e <= keep_through))
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{CSV_HEADER}")?;
        for line in &kept {
            writeln!(f, "{line}")?;
        }
        tracing::debug!(
            "Metrics CSV '{}' ready ({} earlier rows kept)",
            csv_path.display(),
            kept.len()
        );

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.lr, m.train_loss, m.train_acc, m.val_loss, m.val_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch, m.train_loss, m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn row_epoch(line: &str) -> Option<usize> {
    line.split(',').next()?.trim().parse().ok()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(epoch: usize, val_acc: f64) -> EpochMetrics {
        EpochMetrics { epoch, lr: 0.1, train_loss: 1.5, train_acc: 0.4, val_loss: 1.2, val_acc }
    }

    #[test]
    fn test_is_improvement() {
        let m = metrics(2, 0.6);
        assert!(m.is_improvement(0.5));
        assert!(!m.is_improvement(0.6));
        assert!(!m.is_improvement(0.7));
    }

    fn epochs(logger: &MetricsLogger) -> Vec<String> {
        fs::read_to_string(logger.csv_path())
            .unwrap()
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_rows_are_appended_after_header() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path(), 0).unwrap();
        logger.log(&metrics(1, 0.5)).unwrap();
        logger.log(&metrics(2, 0.55)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("1,0.100000,"));
        assert!(lines[2].ends_with(",0.550000"));
    }

    #[test]
    fn test_fresh_run_starts_the_file_over() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path(), 0).unwrap();
        for epoch in 1..=3 {
            logger.log(&metrics(epoch, 0.5)).unwrap();
        }

        let logger = MetricsLogger::new(tmp.path(), 0).unwrap();
        logger.log(&metrics(1, 0.4)).unwrap();
        assert_eq!(epochs(&logger), vec!["1"]);
    }

    #[test]
    fn test_resume_drops_rows_after_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path(), 0).unwrap();
        for epoch in 1..=3 {
            logger.log(&metrics(epoch, 0.5)).unwrap();
        }

        // Checkpoint is at epoch 2, so epoch 3 is trained again
        let logger = MetricsLogger::new(tmp.path(), 2).unwrap();
        logger.log(&metrics(3, 0.6)).unwrap();
        assert_eq!(epochs(&logger), vec!["1", "2", "3"]);

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().next(), Some(CSV_HEADER));
        assert!(text.lines().last().unwrap().ends_with(",0.600000"));
    }
}

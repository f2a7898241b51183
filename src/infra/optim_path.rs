// ============================================================
// Layer 6 — Optimization Path Recorder
// ============================================================
// Appends flat-parameter snapshots to a JSON-lines file, one
// point of the trajectory per line:
//
//   {"step":0,"epoch":0,"loss":null,"accuracy":null,"flat_w":[…]}
//   {"step":50,"epoch":0,"loss":2.17,"accuracy":0.19,"flat_w":[…]}
//
// Step 0 is the initial weights before any update. A fresh run
// truncates the file; a resumed run keeps the points up to its
// checkpoint step and extends the path from there.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// Global optimizer step
    pub step:     usize,
    /// 0-based epoch the step belongs to
    pub epoch:    usize,
    pub loss:     Option<f64>,
    pub accuracy: Option<f64>,
    pub flat_w:   Vec<f32>,
}

pub struct OptimPathWriter {
    path:   PathBuf,
    writer: BufWriter<File>,
}

impl OptimPathWriter {
    /// Start a new path, discarding any earlier one at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)
            .with_context(|| format!("Cannot create optimization path '{}'", path.display()))?;
        Ok(Self { path, writer: BufWriter::new(file) })
    }

    /// Continue the path at `path` after `last_step`. Points recorded
    /// beyond that step belong to epochs that will be trained again and
    /// are dropped.
    pub fn resume(path: impl AsRef<Path>, last_step: usize) -> Result<Self> {
        let path = path.as_ref();
        let kept: Vec<PathPoint> = if path.exists() {
            read_path(path)?.into_iter().filter(|p| p.step <= last_step).collect()
        } else {
            Vec::new()
        };

        let mut writer = Self::create(path)?;
        for point in &kept {
            writer.append(point)?;
        }
        writer.flush()?;
        tracing::debug!("Resuming optimization path after step {last_step} ({} points kept)", kept.len());
        Ok(writer)
    }

    pub fn append(&mut self, point: &PathPoint) -> Result<()> {
        serde_json::to_writer(&mut self.writer, point)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Cannot write '{}'", self.path.display()))
    }
}

/// Read every point of a recorded path.
pub fn read_path(path: impl AsRef<Path>) -> Result<Vec<PathPoint>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Cannot open '{}'", path.display()))?;
    BufReader::new(file)
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .map(|(i, line)| {
            let line = line?;
            serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: malformed path point", path.display(), i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(step: usize, loss: Option<f64>) -> PathPoint {
        PathPoint { step, epoch: 0, loss, accuracy: loss.map(|_| 0.5), flat_w: vec![0.25, -1.0, 3.0] }
    }

    #[test]
    fn test_append_and_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("run/optim_path.jsonl");

        let mut w = OptimPathWriter::create(&file).unwrap();
        w.append(&point(0, None)).unwrap();
        w.append(&point(10, Some(2.3))).unwrap();
        w.flush().unwrap();

        let points = read_path(&file).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], point(0, None));
        assert_eq!(points[1].step, 10);
        assert_eq!(points[1].flat_w, vec![0.25, -1.0, 3.0]);
    }

    #[test]
    fn test_create_discards_previous_path() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("optim_path.jsonl");

        let mut w = OptimPathWriter::create(&file).unwrap();
        w.append(&point(0, None)).unwrap();
        w.append(&point(10, Some(2.3))).unwrap();
        w.flush().unwrap();
        drop(w);

        let mut w = OptimPathWriter::create(&file).unwrap();
        w.append(&point(0, None)).unwrap();
        w.flush().unwrap();

        let steps: Vec<usize> = read_path(&file).unwrap().iter().map(|p| p.step).collect();
        assert_eq!(steps, vec![0]);
    }

    #[test]
    fn test_resume_keeps_points_up_to_step() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("optim_path.jsonl");

        let mut w = OptimPathWriter::create(&file).unwrap();
        for step in [0, 10, 20, 30] {
            w.append(&point(step, Some(1.0))).unwrap();
        }
        w.flush().unwrap();
        drop(w);

        let mut w = OptimPathWriter::resume(&file, 20).unwrap();
        w.append(&point(30, Some(0.5))).unwrap();
        w.flush().unwrap();

        let points = read_path(&file).unwrap();
        let steps: Vec<usize> = points.iter().map(|p| p.step).collect();
        assert_eq!(steps, vec![0, 10, 20, 30]);
        assert_eq!(points[3].loss, Some(0.5));
    }

    #[test]
    fn test_resume_without_file_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("optim_path.jsonl");
        let mut w = OptimPathWriter::resume(&file, 40).unwrap();
        w.flush().unwrap();
        assert!(read_path(&file).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("bad.jsonl");
        fs::write(&file, "{\"step\":0}\nnot json\n").unwrap();
        let err = format!("{:#}", read_path(&file).unwrap_err());
        assert!(err.contains("bad.jsonl:1"));
    }
}

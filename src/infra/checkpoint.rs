// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What lives in a run directory:
//   model_epoch_<n>.mpk   ← weights after epoch n (every save_every)
//   model_best.mpk        ← weights with the best validation accuracy
//   latest_epoch.json     ← number of the newest model_epoch_<n>
//   best.json             ← {"epoch": n, "accuracy": a}
//   train_config.json     ← everything needed to rebuild the model
//
// The config is saved separately because a model must be rebuilt
// with the same architecture before weights can be loaded into it.
//
// CompactRecorder writes MessagePack with half-precision floats;
// loading fails if the architecture does not match.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{prelude::*, record::CompactRecorder};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;

/// Contents of best.json.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestCheckpoint {
    pub epoch:    usize,
    pub accuracy: f64,
}

/// Saves and loads checkpoints inside one run directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager for `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save weights as model_epoch_<epoch> and point latest_epoch.json at it.
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M, epoch: usize) -> Result<()> {
        self.record(model, &format!("model_epoch_{epoch}"))?;
        self.write_json("latest_epoch.json", &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Save weights as model_best and record the epoch and accuracy.
    pub fn save_best<B: Backend, M: Module<B>>(
        &self,
        model:    &M,
        epoch:    usize,
        accuracy: f64,
    ) -> Result<()> {
        self.record(model, "model_best")?;
        self.write_json("best.json", &BestCheckpoint { epoch, accuracy })?;
        tracing::debug!("Saved best checkpoint: epoch {} ({:.2}%)", epoch, accuracy * 100.0);
        Ok(())
    }

    /// Load the weights of the newest model_epoch_<n> into `model`.
    pub fn load_latest<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        device: &B::Device,
    ) -> Result<(M, usize)> {
        let epoch = self.latest_epoch()?;
        tracing::info!("Loading checkpoint from epoch {}", epoch);
        let model = self.restore(model, &format!("model_epoch_{epoch}"), device)?;
        Ok((model, epoch))
    }

    /// Load the best weights into `model`.
    pub fn load_best<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        device: &B::Device,
    ) -> Result<(M, BestCheckpoint)> {
        let best = self.best()?;
        tracing::info!("Loading best checkpoint (epoch {})", best.epoch);
        let model = self.restore(model, "model_best", device)?;
        Ok((model, best))
    }

    /// Save the training configuration as pretty JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json("train_config.json", cfg)?;
        tracing::debug!("Saved training config to '{}'", self.dir.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Has this run been trained?",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }

    /// Number of the newest saved epoch, from latest_epoch.json.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Has this run been trained?", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    pub fn best(&self) -> Result<BestCheckpoint> {
        let path = self.dir.join("best.json");
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'", path.display()))?;
        Ok(serde_json::from_str(&s)?)
    }

    fn record<B: Backend, M: Module<B>>(&self, model: &M, name: &str) -> Result<()> {
        // The recorder adds the file extension
        let path = self.dir.join(name);
        model
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))
    }

    fn restore<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        name:   &str,
        device: &B::Device,
    ) -> Result<M> {
        let path = self.dir.join(name);
        model
            .load_file(path.clone(), &CompactRecorder::new(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))
    }
}

// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Validate the config
//   Step 2: Load the train and test splits  (Layer 4 - data)
//   Step 3: Pick the validation set         (Layer 4 - data)
//   Step 4: Build datasets                  (Layer 4 - data)
//   Step 5: Save config                     (Layer 6 - infra)
//   Step 6: Run training loop               (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{dataset::ImageDataset, source_for, splitter::split_train_val};
use crate::domain::{
    architecture::{Architecture, ShortcutKind},
    image::{DatasetKind, Split},
    optimizer::{OptimizerKind, OptimizerSettings},
    schedule::LrSchedule,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::BackendKind,
    classifier::ModelSpec,
    trainer::{run_training, TrainReport},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved as train_config.json in the run directory so the model can be
// rebuilt for evaluation or resumed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub arch:              Architecture,
    pub dataset:           DatasetKind,
    pub data_dir:          String,
    /// Run directory for checkpoints, metrics and the optimization path
    pub save_dir:          String,
    pub backend:           BackendKind,
    pub optimizer:         OptimizerKind,
    pub lr:                f64,
    pub momentum:          f64,
    pub weight_decay:      f64,
    pub batch_size:        usize,
    pub epochs:            usize,
    /// 0-based epochs at which the learning rate is multiplied by gamma
    pub milestones:        Vec<usize>,
    pub gamma:             f64,
    pub save_every:        usize,
    pub print_every:       usize,
    pub num_workers:       usize,
    pub seed:              u64,
    /// Fraction of the training split held out for validation;
    /// 0 validates on the test split
    pub val_fraction:      f64,
    pub augment:           bool,
    pub shortcut:          ShortcutKind,
    pub hidden_dim:        usize,
    pub num_hidden_layers: usize,
    pub track_path:        bool,
    pub track_every:       usize,
    pub resume:            bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            arch:              Architecture::Resnet20,
            dataset:           DatasetKind::Cifar10,
            data_dir:          "data/cifar-10-batches-bin".to_string(),
            save_dir:          "save_resnet20".to_string(),
            backend:           BackendKind::Wgpu,
            optimizer:         OptimizerKind::Sgd,
            lr:                0.1,
            momentum:          0.9,
            weight_decay:      1e-4,
            batch_size:        128,
            epochs:            200,
            milestones:        vec![100, 150],
            gamma:             0.1,
            save_every:        10,
            print_every:       50,
            num_workers:       4,
            seed:              42,
            val_fraction:      0.0,
            augment:           true,
            shortcut:          ShortcutKind::A,
            hidden_dim:        100,
            num_hidden_layers: 1,
            track_path:        false,
            track_every:       50,
            resume:            false,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch size must be greater than 0");
        }
        if self.epochs == 0 {
            bail!("epochs must be greater than 0");
        }
        if !(self.lr > 0.0) {
            bail!("learning rate must be positive, got {}", self.lr);
        }
        if !(0.0..1.0).contains(&self.val_fraction) {
            bail!("validation fraction must be in [0, 1), got {}", self.val_fraction);
        }
        if self.save_every == 0 || self.print_every == 0 || self.track_every == 0 {
            bail!("save_every, print_every and track_every must be greater than 0");
        }
        Ok(())
    }

    /// Step schedule; the deepest ResNets warm up for one epoch.
    pub fn lr_schedule(&self) -> LrSchedule {
        let schedule = LrSchedule::new(self.lr, self.milestones.clone(), self.gamma);
        if self.arch.needs_warmup() {
            schedule.with_warmup(1)
        } else {
            schedule
        }
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings { momentum: self.momentum, weight_decay: self.weight_decay }
    }

    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            shortcut:          self.shortcut,
            hidden_dim:        self.hidden_dim,
            num_hidden_layers: self.num_hidden_layers,
            ..ModelSpec::new(self.arch, self.dataset.image_shape(), self.dataset.num_classes())
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        tracing::info!(
            "Training {} on {} with {} (lr={}, batch={}, epochs={})",
            cfg.arch, cfg.dataset, cfg.optimizer, cfg.lr, cfg.batch_size, cfg.epochs
        );

        // ── Step 2: Load splits ───────────────────────────────────────────────
        let source = source_for(cfg.dataset, &cfg.data_dir);
        let train_records = source.load(Split::Train)?;
        tracing::info!(
            "Loaded {} training images of shape {}",
            train_records.len(),
            source.shape()
        );

        // ── Step 3: Validation set ────────────────────────────────────────────
        let (train_records, val_records) = if cfg.val_fraction > 0.0 {
            split_train_val(train_records, 1.0 - cfg.val_fraction, cfg.seed)
        } else {
            let test = source.load(Split::Test)?;
            (train_records, test)
        };
        tracing::info!(
            "Split: {} train, {} validation",
            train_records.len(),
            val_records.len()
        );

        if train_records.is_empty() || val_records.is_empty() {
            bail!("training and validation sets must both be non-empty");
        }

        // ── Step 4: Build Burn datasets ───────────────────────────────────────
        let train_dataset = ImageDataset::new(train_records);
        let val_dataset   = ImageDataset::new(val_records);

        // ── Step 5: Save config ───────────────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.save_dir)?;
        ckpt.save_config(cfg)?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, val_dataset, &ckpt)
    }
}

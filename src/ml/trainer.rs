// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and any Burn
// optimizer.
//
// Per epoch:
//   1. lr ← LrSchedule::lr_at(epoch)
//   2. for each batch: forward → cross-entropy → backward → step
//      (every track_every steps the flat weights are appended to
//       optim_path.jsonl)
//   3. validate model.valid() on the inner backend
//   4. log + metrics.csv row; model_best on improvement;
//      model_epoch_<n> every save_every epochs and at the end
//
// Burn notes:
//   - Training runs on an Autodiff<…> backend for gradients
//   - model.valid() returns the model on B::InnerBackend, so the
//     validation batcher is built for the inner backend too
//   - the network and the optimizer are both type parameters, so
//     the choice made at run time is turned into a type here, once
//
// Reference: Burn Book §5 (Custom Training Loop)

use std::sync::Arc;

use anyhow::{Context, Result};
use burn::{
    backend::Autodiff,
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
};
use crate::domain::{architecture::Architecture, image::DatasetKind};
use crate::infra::{
    checkpoint::{BestCheckpoint, CheckpointManager},
    metrics::{EpochMetrics, MetricsLogger},
    optim_path::{OptimPathWriter, PathPoint},
};
use crate::ml::{
    backend::{BackendKind, NdArrayBackend, WgpuBackend},
    classifier::ImageClassifier,
    evaluator::{count_correct, evaluate, BatchStats},
    flat_params::FlatParams,
    optimizer::{configure_optimizer, OptimizerRun},
};

pub const OPTIM_PATH_FILE: &str = "optim_path.jsonl";

/// Outcome of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub best_accuracy:    f64,
    /// 1-based epoch of the best checkpoint, 0 if none was saved
    pub best_epoch:       usize,
    pub epochs_run:       usize,
    pub final_train_loss: f64,
    pub final_train_acc:  f64,
    pub final_val_loss:   f64,
    pub final_val_acc:    f64,
}

/// Train on the backend named in the config.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    ckpt:          &CheckpointManager,
) -> Result<TrainReport> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_on::<Autodiff<WgpuBackend>>(cfg, train_dataset, val_dataset, ckpt, device)
        }
        BackendKind::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            train_on::<Autodiff<NdArrayBackend>>(cfg, train_dataset, val_dataset, ckpt, device)
        }
    }
}

/// Build the configured network on `B` and train it with the configured optimizer.
pub fn train_on<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    ckpt:          &CheckpointManager,
    device:        B::Device,
) -> Result<TrainReport> {
    B::seed(cfg.seed);
    let session = TrainSession::<B>::new(cfg, train_dataset, val_dataset, ckpt, device.clone());
    let spec = cfg.model_spec();

    match spec.arch {
        Architecture::LeNet => session.start(spec.lenet().init::<B>(&device)),
        Architecture::Mlp   => session.start(spec.mlp().init::<B>(&device)),
        arch => {
            let resnet = spec
                .resnet()
                .with_context(|| format!("{arch} is not a ResNet"))?;
            session.start(resnet.init::<B>(&device))
        }
    }
}

// ─── TrainSession ─────────────────────────────────────────────────────────────
/// Data loaders, config, and checkpoint directory of one run.
pub struct TrainSession<'a, B: AutodiffBackend> {
    cfg:          &'a TrainConfig,
    ckpt:         &'a CheckpointManager,
    device:       B::Device,
    train_loader: Arc<dyn DataLoader<ImageBatch<B>>>,
    val_loader:   Arc<dyn DataLoader<ImageBatch<B::InnerBackend>>>,
}

impl<'a, B: AutodiffBackend> TrainSession<'a, B> {
    pub fn new(
        cfg:           &'a TrainConfig,
        train_dataset: ImageDataset,
        val_dataset:   ImageDataset,
        ckpt:          &'a CheckpointManager,
        device:        B::Device,
    ) -> Self {
        // Crop + flip only makes sense for the padded CIFAR images
        let augment = cfg.augment && cfg.dataset == DatasetKind::Cifar10;

        let train_batcher = ImageBatcher::<B>::new(device.clone(), cfg.dataset)
            .with_augmentation(augment)
            .with_seed(cfg.seed);
        let mut train_builder = DataLoaderBuilder::new(train_batcher)
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed);
        if cfg.num_workers > 0 {
            train_builder = train_builder.num_workers(cfg.num_workers);
        }
        let train_loader = train_builder.build(train_dataset);

        // Validation on the inner backend: no autodiff overhead
        let val_batcher = ImageBatcher::<B::InnerBackend>::new(device.clone(), cfg.dataset);
        let mut val_builder = DataLoaderBuilder::new(val_batcher).batch_size(cfg.batch_size);
        if cfg.num_workers > 0 {
            val_builder = val_builder.num_workers(cfg.num_workers);
        }
        let val_loader = val_builder.build(val_dataset);

        Self { cfg, ckpt, device, train_loader, val_loader }
    }

    /// Resume if asked, then train `model` with the configured optimizer.
    pub fn start<M>(self, model: M) -> Result<TrainReport>
    where
        M: ImageClassifier<B> + AutodiffModule<B>,
        M::InnerModule: ImageClassifier<B::InnerBackend>,
    {
        let (model, start_epoch) = if self.cfg.resume {
            match self.ckpt.latest_epoch() {
                Ok(_) => self.ckpt.load_latest::<B, M>(model, &self.device)?,
                Err(_) => {
                    tracing::warn!("No checkpoint in '{}', starting from scratch", self.ckpt.dir().display());
                    (model, 0)
                }
            }
        } else {
            (model, 0)
        };

        let summary = FlatParams::<B>::summary(&model);
        tracing::info!(
            "Model {} ready: {} parameters, {} layers",
            self.cfg.arch, summary.total_params, summary.layers
        );

        let settings = self.cfg.optimizer_settings();
        configure_optimizer(self.cfg.optimizer, &settings, Resume { session: self, model, start_epoch })
    }

    /// Run the epoch loop with any Burn optimizer, starting after
    /// `start_epoch` completed epochs.
    pub fn fit<M, O>(&self, model: M, mut optim: O, start_epoch: usize) -> Result<TrainReport>
    where
        M: ImageClassifier<B> + AutodiffModule<B>,
        M::InnerModule: ImageClassifier<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        let cfg = self.cfg;
        let schedule = cfg.lr_schedule();
        let steps_per_epoch = self.train_loader.num_items().div_ceil(cfg.batch_size);
        let mut step = start_epoch * steps_per_epoch;

        // Rows and points past the checkpoint are re-trained, so they go
        let metrics = MetricsLogger::new(self.ckpt.dir(), start_epoch)?;
        tracing::info!("Logging epoch metrics to '{}'", metrics.csv_path().display());
        let mut path = match (cfg.track_path, start_epoch) {
            (false, _) => None,
            (true, 0) => Some(OptimPathWriter::create(self.ckpt.dir().join(OPTIM_PATH_FILE))?),
            (true, _) => Some(OptimPathWriter::resume(self.ckpt.dir().join(OPTIM_PATH_FILE), step)?),
        };

        if let Some(writer) = path.as_mut() {
            if start_epoch == 0 {
                writer.append(&PathPoint {
                    step: 0, epoch: 0, loss: None, accuracy: None,
                    flat_w: FlatParams::<B>::flat_vec(&model)?,
                })?;
            }
        }

        let mut best: Option<BestCheckpoint> =
            if start_epoch > 0 { self.ckpt.best().ok() } else { None };
        let mut report = TrainReport {
            best_accuracy:    best.map_or(0.0, |b| b.accuracy),
            best_epoch:       best.map_or(0, |b| b.epoch),
            epochs_run:       0,
            final_train_loss: f64::NAN,
            final_train_acc:  0.0,
            final_val_loss:   f64::NAN,
            final_val_acc:    0.0,
        };

        if start_epoch >= cfg.epochs {
            tracing::warn!("Checkpoint is already at epoch {}, nothing to train", start_epoch);
            return Ok(report);
        }

        let mut model = model;

        for epoch in start_epoch..cfg.epochs {
            let lr = schedule.lr_at(epoch);

            // ── Training phase ────────────────────────────────────────────────
            let mut stats = BatchStats::default();

            for batch in self.train_loader.iter() {
                let batch_size = batch.targets.dims()[0];
                let logits = model.forward(batch.images);

                let loss = CrossEntropyLossConfig::new()
                    .init(&logits.device())
                    .forward(logits.clone(), batch.targets.clone());
                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                let correct = count_correct(logits, batch.targets);
                stats.add(loss_val, correct, batch_size);

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);
                step += 1;

                if step % cfg.print_every == 0 {
                    tracing::debug!("epoch {} step {} loss {:.4}", epoch + 1, step, loss_val);
                }

                if let Some(writer) = path.as_mut() {
                    if step % cfg.track_every == 0 {
                        writer.append(&PathPoint {
                            step,
                            epoch,
                            loss:     Some(loss_val),
                            accuracy: Some(correct as f64 / batch_size as f64),
                            flat_w:   FlatParams::<B>::flat_vec(&model)?,
                        })?;
                    }
                }
            }

            if let Some(writer) = path.as_mut() {
                writer.flush()?;
            }

            // ── Validation phase ──────────────────────────────────────────────
            let train = stats.report();
            let val = evaluate(&model.valid(), &self.val_loader);

            let row = EpochMetrics {
                epoch:      epoch + 1,
                lr,
                train_loss: train.loss,
                train_acc:  train.accuracy,
                val_loss:   val.loss,
                val_acc:    val.accuracy,
            };

            tracing::info!(
                "Epoch {:>3}/{} | lr={:.4} | train_loss={:.4} | train_acc={:.2}% | val_loss={:.4} | val_acc={:.2}%",
                row.epoch, cfg.epochs, lr, row.train_loss, row.train_acc * 100.0,
                row.val_loss, row.val_acc * 100.0,
            );
            metrics.log(&row)?;

            // ── Checkpoints ───────────────────────────────────────────────────
            if best.map_or(true, |b| row.is_improvement(b.accuracy)) {
                self.ckpt.save_best::<B, M>(&model, row.epoch, row.val_acc)?;
                best = Some(BestCheckpoint { epoch: row.epoch, accuracy: row.val_acc });
                report.best_accuracy = row.val_acc;
                report.best_epoch    = row.epoch;
            }

            if row.epoch % cfg.save_every == 0 || row.epoch == cfg.epochs {
                self.ckpt.save_model::<B, M>(&model, row.epoch)?;
                tracing::info!("Checkpoint saved for epoch {}", row.epoch);
            }

            report.epochs_run      += 1;
            report.final_train_loss = row.train_loss;
            report.final_train_acc  = row.train_acc;
            report.final_val_loss   = row.val_loss;
            report.final_val_acc    = row.val_acc;
        }

        tracing::info!(
            "Training complete! best val_acc={:.2}% at epoch {}",
            report.best_accuracy * 100.0, report.best_epoch
        );
        Ok(report)
    }
}

/// Hands the configured optimizer to `TrainSession::fit`.
struct Resume<'a, B: AutodiffBackend, M> {
    session:     TrainSession<'a, B>,
    model:       M,
    start_epoch: usize,
}

impl<'a, B, M> OptimizerRun<B, M> for Resume<'a, B, M>
where
    B: AutodiffBackend,
    M: ImageClassifier<B> + AutodiffModule<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
{
    type Output = Result<TrainReport>;

    fn run<O: Optimizer<M, B>>(self, optim: O) -> Result<TrainReport> {
        self.session.fit(self.model, optim, self.start_epoch)
    }
}

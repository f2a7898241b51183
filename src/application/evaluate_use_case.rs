// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Rebuilds a trained model from its run directory and scores it
// on the test split:
//
//   Step 1: Read train_config.json       (Layer 6 - infra)
//   Step 2: Rebuild the architecture     (Layer 5 - ml)
//   Step 3: Load best or latest weights  (Layer 6 - infra)
//   Step 4: Evaluate on the test split   (Layer 5 - ml)

use anyhow::{Context, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};

use crate::data::{batcher::ImageBatcher, dataset::ImageDataset, source_for};
use crate::domain::{architecture::Architecture, image::Split};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::{BackendKind, NdArrayBackend, WgpuBackend},
    classifier::ImageClassifier,
    evaluator::{evaluate, EvalReport},
};

use super::train_use_case::TrainConfig;

/// Which saved weights to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointChoice {
    Best,
    Latest,
}

pub struct EvaluateUseCase {
    run_dir:    String,
    checkpoint: CheckpointChoice,
    /// Overrides the data directory stored in the run's config
    data_dir:   Option<String>,
    backend:    Option<BackendKind>,
}

impl EvaluateUseCase {
    pub fn new(run_dir: impl Into<String>) -> Self {
        Self {
            run_dir:    run_dir.into(),
            checkpoint: CheckpointChoice::Best,
            data_dir:   None,
            backend:    None,
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: CheckpointChoice) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn with_data_dir(mut self, data_dir: Option<String>) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_backend(mut self, backend: Option<BackendKind>) -> Self {
        self.backend = backend;
        self
    }

    pub fn execute(&self) -> Result<EvalReport> {
        let ckpt = CheckpointManager::new(&self.run_dir)?;
        let cfg = ckpt.load_config()?;

        let data_dir = self.data_dir.as_deref().unwrap_or(&cfg.data_dir);
        let records = source_for(cfg.dataset, data_dir).load(Split::Test)?;
        tracing::info!("Evaluating {} on {} test images", cfg.arch, records.len());
        let dataset = ImageDataset::new(records);

        let report = match self.backend.unwrap_or(cfg.backend) {
            BackendKind::Wgpu => {
                self.evaluate_on::<WgpuBackend>(&cfg, &ckpt, dataset, Default::default())?
            }
            BackendKind::NdArray => {
                self.evaluate_on::<NdArrayBackend>(&cfg, &ckpt, dataset, Default::default())?
            }
        };

        println!(
            "{} | test_loss={:.4} | test_acc={:.2}% | error={:.2}% | samples={}",
            cfg.arch,
            report.loss,
            report.accuracy * 100.0,
            (1.0 - report.accuracy) * 100.0,
            report.samples
        );
        Ok(report)
    }

    fn evaluate_on<B: Backend>(
        &self,
        cfg:     &TrainConfig,
        ckpt:    &CheckpointManager,
        dataset: ImageDataset,
        device:  B::Device,
    ) -> Result<EvalReport> {
        let spec = cfg.model_spec();
        match spec.arch {
            Architecture::LeNet => self.score(spec.lenet().init::<B>(&device), cfg, ckpt, dataset, device),
            Architecture::Mlp   => self.score(spec.mlp().init::<B>(&device), cfg, ckpt, dataset, device),
            arch => {
                let resnet = spec
                    .resnet()
                    .with_context(|| format!("{arch} is not a ResNet"))?
                    .init::<B>(&device);
                self.score(resnet, cfg, ckpt, dataset, device)
            }
        }
    }

    fn score<B: Backend, M: ImageClassifier<B>>(
        &self,
        model:   M,
        cfg:     &TrainConfig,
        ckpt:    &CheckpointManager,
        dataset: ImageDataset,
        device:  B::Device,
    ) -> Result<EvalReport> {
        let model = match self.checkpoint {
            CheckpointChoice::Best => ckpt.load_best::<B, M>(model, &device)?.0,
            CheckpointChoice::Latest => ckpt.load_latest::<B, M>(model, &device)?.0,
        };

        let loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device, cfg.dataset))
            .batch_size(cfg.batch_size)
            .build(dataset);

        Ok(evaluate(&model, &loader))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::DatasetKind;

    #[test]
    fn test_untrained_run_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = EvaluateUseCase::new(tmp.path().to_string_lossy())
            .execute()
            .unwrap_err();
        assert!(format!("{err:#}").contains("train_config.json"));
    }

    #[test]
    fn test_missing_weights_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let cfg = TrainConfig {
            arch:    Architecture::Mlp,
            dataset: DatasetKind::Mnist,
            backend: BackendKind::NdArray,
            ..TrainConfig::default()
        };

        let uc = EvaluateUseCase::new(tmp.path().to_string_lossy());
        let dataset = ImageDataset::new(Vec::new());
        let err = uc
            .evaluate_on::<NdArrayBackend>(&cfg, &ckpt, dataset, Default::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("best.json"));
    }
}

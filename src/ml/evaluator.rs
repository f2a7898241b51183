// ============================================================
// Layer 5 — Evaluation
// ============================================================
// Runs a model over every batch of a loader without gradients
// and reports mean cross-entropy and top-1 accuracy.
//
//   loss     = Σ batch_loss · batch_size / samples
//   accuracy = correct / samples            (0.0 – 1.0)
//
// argmax(1) returns [batch, 1], so it is flattened to [batch]
// before comparing with the targets.

use std::sync::Arc;

use burn::{
    data::dataloader::DataLoader,
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::ImageBatch;
use crate::ml::classifier::ImageClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

/// Running totals for loss and accuracy over a sequence of batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchStats {
    loss_sum: f64,
    correct:  usize,
    samples:  usize,
}

impl BatchStats {
    pub fn add(&mut self, mean_loss: f64, correct: usize, batch_size: usize) {
        self.loss_sum += mean_loss * batch_size as f64;
        self.correct  += correct;
        self.samples  += batch_size;
    }

    pub fn report(&self) -> EvalReport {
        if self.samples == 0 {
            return EvalReport { loss: f64::NAN, accuracy: 0.0, samples: 0 };
        }
        EvalReport {
            loss:     self.loss_sum / self.samples as f64,
            accuracy: self.correct as f64 / self.samples as f64,
            samples:  self.samples,
        }
    }
}

/// Number of rows whose highest logit matches the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

pub fn evaluate<B, M>(model: &M, loader: &Arc<dyn DataLoader<ImageBatch<B>>>) -> EvalReport
where
    B: Backend,
    M: ImageClassifier<B>,
{
    let mut stats = BatchStats::default();

    for batch in loader.iter() {
        let batch_size = batch.targets.dims()[0];
        let logits = model.forward(batch.images);

        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), batch.targets.clone());

        let correct = count_correct(logits, batch.targets);
        stats.add(loss.into_scalar().elem::<f64>(), correct, batch_size);
    }

    stats.report()
}

use anyhow::{Context, Result};
use burn::backend::Autodiff;

use crate::domain::architecture::Architecture;
use crate::ml::{
    backend::NdArrayBackend,
    classifier::ModelSpec,
    flat_params::{FlatParams, ModelSummary},
};

type SummaryBackend = Autodiff<NdArrayBackend>;

/// Trainable parameter and layer counts of the network described by
/// `spec`, built once on the CPU backend. Autodiff marks which tensors
/// are trained, so batch-norm running statistics are left out.
pub fn summarize(spec: &ModelSpec) -> Result<ModelSummary> {
    let device = Default::default();
    let summary = match spec.arch {
        Architecture::LeNet => spec.lenet().init::<SummaryBackend>(&device).summary(),
        Architecture::Mlp   => spec.mlp().init::<SummaryBackend>(&device).summary(),
        arch => spec
            .resnet()
            .with_context(|| format!("{arch} is not a ResNet"))?
            .init::<SummaryBackend>(&device)
            .summary(),
    };
    Ok(summary)
}

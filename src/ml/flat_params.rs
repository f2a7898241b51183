// ============================================================
// Layer 5 — Flat Parameters
// ============================================================
// Views any Burn module as a single vector of numbers, so an
// optimisation trajectory can be stored as a list of points in
// weight space and any point can be loaded back into the model.
//
//   flat_params()      → concat(flatten(t) for t in module)
//   param_shapes()     → (index, dims, numel) for each t
//   load_flat_params() → every t replaced by the matching slice
//
// "t in module" is Burn's visiting order: fields in declaration
// order, Vec elements in index order. It is deterministic for a
// given architecture, so vectors from two models of the same
// config line up element by element.
//
// Burn visits every float tensor a module records, which
// includes batch-norm running statistics. They travel with the
// flat vector but are not counted by summary(), which only counts
// tensors that track gradients (and so needs an autodiff backend).
//
// Reference: burn::module::{ModuleVisitor, ModuleMapper}

use anyhow::{anyhow, bail, Result};
use burn::{
    module::{ModuleMapper, ModuleVisitor, ParamId},
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// Position and shape of one tensor inside the flat vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamShape {
    pub index:     usize,
    pub dims:      Vec<usize>,
    pub numel:     usize,
    /// False for buffers such as batch-norm running statistics
    pub trainable: bool,
}

/// Trainable parameter and layer counts of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub total_params: usize,
    /// Weight tensors of rank > 1 (conv kernels and dense matrices)
    pub layers:       usize,
}

/// Flatten / unflatten extension for every Burn module.
pub trait FlatParams<B: Backend>: Module<B> + Sized {
    /// All float tensors flattened and concatenated, detached from the graph.
    fn flat_params(&self) -> Result<Tensor<B, 1>>;

    fn param_shapes(&self) -> Vec<ParamShape>;

    /// Rebuild every tensor from consecutive slices of `flat`.
    fn load_flat_params(self, flat: Tensor<B, 1>) -> Result<Self>;

    /// The flat vector copied to host memory.
    fn flat_vec(&self) -> Result<Vec<f32>> {
        self.flat_params()?
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("cannot read flat parameters: {e:?}"))
    }

    /// Counts gradient-tracking tensors only; on a backend without
    /// autodiff nothing tracks gradients and both counts are 0.
    fn summary(&self) -> ModelSummary {
        let trainable: Vec<ParamShape> =
            self.param_shapes().into_iter().filter(|s| s.trainable).collect();
        ModelSummary {
            total_params: trainable.iter().map(|s| s.numel).sum(),
            layers:       trainable.iter().filter(|s| s.dims.len() > 1).count(),
        }
    }
}

impl<B: Backend, M: Module<B>> FlatParams<B> for M {
    fn flat_params(&self) -> Result<Tensor<B, 1>> {
        let mut collector = Flattener { parts: Vec::new() };
        self.visit(&mut collector);
        if collector.parts.is_empty() {
            bail!("module has no float parameters to flatten");
        }
        Ok(Tensor::cat(collector.parts, 0))
    }

    fn param_shapes(&self) -> Vec<ParamShape> {
        let mut collector = ShapeCollector { shapes: Vec::new() };
        self.visit(&mut collector);
        collector.shapes
    }

    fn load_flat_params(self, flat: Tensor<B, 1>) -> Result<Self> {
        let expected: usize = self.param_shapes().iter().map(|s| s.numel).sum();
        let [given] = flat.dims();
        if given != expected {
            bail!("flat vector has {given} values, model expects {expected}");
        }

        let mut mapper = Unflattener { flat, offset: 0 };
        let model = self.map(&mut mapper);
        debug_assert_eq!(mapper.offset, expected);
        Ok(model)
    }
}

// ─── Visitors ─────────────────────────────────────────────────────────────────

struct ShapeCollector {
    shapes: Vec<ParamShape>,
}

impl<B: Backend> ModuleVisitor<B> for ShapeCollector {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        let dims = tensor.dims().to_vec();
        let numel = dims.iter().product();
        self.shapes.push(ParamShape {
            index: self.shapes.len(),
            dims,
            numel,
            trainable: tensor.is_require_grad(),
        });
    }
}

struct Flattener<B: Backend> {
    parts: Vec<Tensor<B, 1>>,
}

impl<B: Backend> ModuleVisitor<B> for Flattener<B> {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        let numel: usize = tensor.dims().iter().product();
        self.parts.push(tensor.clone().detach().reshape([numel]));
    }
}

struct Unflattener<B: Backend> {
    flat:   Tensor<B, 1>,
    offset: usize,
}

impl<B: Backend> ModuleMapper<B> for Unflattener<B> {
    fn map_float<const D: usize>(&mut self, _id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        let dims = tensor.dims();
        let numel: usize = dims.iter().product();
        let require_grad = tensor.is_require_grad();

        let values = self
            .flat
            .clone()
            .slice([self.offset..self.offset + numel])
            .reshape(dims)
            .detach();
        self.offset += numel;

        values.set_require_grad(require_grad)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{lenet::LeNetConfig, mlp::MlpConfig, resnet::resnet20};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<NdArray>;

    #[test]
    fn test_flat_length_matches_shapes() {
        let device = Default::default();
        let model = MlpConfig::new(6, 2).with_hidden_dim(4).init::<TestBackend>(&device);
        let shapes = model.param_shapes();
        // hidden weight, hidden bias, output weight, output bias
        assert_eq!(shapes.len(), 4);
        let total: usize = shapes.iter().map(|s| s.numel).sum();
        assert_eq!(total, 6 * 4 + 4 + 4 * 2 + 2);
        assert_eq!(model.flat_params().unwrap().dims(), [total]);
    }

    #[test]
    fn test_load_of_own_vector_is_identity() {
        let device = Default::default();
        let model = LeNetConfig::new(1, 28, 10).init::<TestBackend>(&device);
        let before = model.flat_vec().unwrap();

        let model = model.load_flat_params(Tensor::from_floats(before.as_slice(), &device)).unwrap();
        assert_eq!(model.flat_vec().unwrap(), before);
    }

    #[test]
    fn test_load_moves_model_to_new_point() {
        let device = Default::default();
        let a = MlpConfig::new(3, 2).with_hidden_dim(2).init::<TestBackend>(&device);
        let n = a.flat_params().unwrap().dims()[0];

        let target: Vec<f32> = (0..n).map(|i| i as f32 * 0.5).collect();
        let a = a.load_flat_params(Tensor::from_floats(target.as_slice(), &device)).unwrap();
        assert_eq!(a.flat_vec().unwrap(), target);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let device = Default::default();
        let model = MlpConfig::new(3, 2).init::<TestBackend>(&device);
        let err = model
            .load_flat_params(Tensor::zeros([5], &device))
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("flat vector has 5 values"));
    }

    #[test]
    fn test_loaded_params_stay_trainable() {
        let device = Default::default();
        let model = MlpConfig::new(4, 2).init::<TestAutodiffBackend>(&device);
        let flat = model.flat_params().unwrap();
        let model = model.load_flat_params(flat).unwrap();

        // A backward pass must reach every parameter again.
        let x = Tensor::<TestAutodiffBackend, 4>::ones([1, 1, 2, 2], &device);
        let loss = crate::ml::classifier::ImageClassifier::forward(&model, x).sum();
        let grads = loss.backward();
        let grads = burn::optim::GradientsParams::from_grads(grads, &model);
        assert!(!grads.is_empty());
    }

    #[test]
    fn test_running_stats_are_flattened_but_not_counted() {
        let device = Default::default();
        let model = resnet20(10).init::<TestAutodiffBackend>(&device);
        let shapes = model.param_shapes();
        let buffers: usize = shapes.iter().filter(|s| !s.trainable).map(|s| s.numel).sum();

        // running mean + var of 19 batch norms: 2 × (16·7 + 32·6 + 64·6)
        assert_eq!(buffers, 1_376);
        assert_eq!(model.flat_params().unwrap().dims(), [269_722 + 1_376]);
        assert_eq!(model.summary().total_params, 269_722);
    }

    #[test]
    fn test_summary_needs_autodiff() {
        let device = Default::default();
        let model = MlpConfig::new(4, 2).init::<TestBackend>(&device);
        assert_eq!(model.summary().total_params, 0);
    }
}

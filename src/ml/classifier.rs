// ============================================================
// Layer 5 — Classifier Abstraction
// ============================================================
// Every network maps a batch of images to class logits. The
// training loop, the evaluator and the summary only need this
// one method, so they are written once, generic over the model.
//
// ModelSpec carries everything needed to rebuild a model from a
// saved training config (architecture, input shape, widths).

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{
    architecture::{Architecture, ShortcutKind},
    image::ImageShape,
};
use crate::ml::{lenet::LeNetConfig, mlp::MlpConfig, resnet::ResNetConfig};

/// A module that turns images [N, C, H, W] into logits [N, classes].
pub trait ImageClassifier<B: Backend>: Module<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub arch:              Architecture,
    pub shape:             ImageShape,
    pub num_classes:       usize,
    pub shortcut:          ShortcutKind,
    pub hidden_dim:        usize,
    pub num_hidden_layers: usize,
}

impl ModelSpec {
    pub fn new(arch: Architecture, shape: ImageShape, num_classes: usize) -> Self {
        Self {
            arch,
            shape,
            num_classes,
            shortcut: ShortcutKind::A,
            hidden_dim: 100,
            num_hidden_layers: 1,
        }
    }

    pub fn resnet(&self) -> Option<ResNetConfig> {
        ResNetConfig::for_arch(self.arch, self.num_classes).map(|cfg| {
            cfg.with_input_channels(self.shape.channels)
                .with_shortcut(self.shortcut)
        })
    }

    pub fn lenet(&self) -> LeNetConfig {
        LeNetConfig::for_shape(self.shape, self.num_classes)
    }

    pub fn mlp(&self) -> MlpConfig {
        MlpConfig::new(self.shape.num_pixels(), self.num_classes)
            .with_hidden_dim(self.hidden_dim)
            .with_num_hidden_layers(self.num_hidden_layers)
    }
}

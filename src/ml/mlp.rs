use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
};

use crate::ml::classifier::ImageClassifier;

/// Fully connected classifier over flattened pixels.
#[derive(Config, Debug)]
pub struct MlpConfig {
    pub input_dim:         usize,
    pub num_classes:       usize,
    #[config(default = 1)]
    pub num_hidden_layers: usize,
    #[config(default = 100)]
    pub hidden_dim:        usize,
}

impl MlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let mut hidden = Vec::with_capacity(self.num_hidden_layers);
        let mut width = self.input_dim;
        for _ in 0..self.num_hidden_layers {
            hidden.push(LinearConfig::new(width, self.hidden_dim).init(device));
            width = self.hidden_dim;
        }
        Mlp {
            hidden,
            output: LinearConfig::new(width, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    hidden:     Vec<Linear<B>>,
    output:     Linear<B>,
    activation: Relu,
}

impl<B: Backend> ImageClassifier<B> for Mlp<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = images.flatten::<2>(1, 3);
        let x = self
            .hidden
            .iter()
            .fold(x, |x, layer| self.activation.forward(layer.forward(x)));
        self.output.forward(x)
    }
}

// ============================================================
// Layer 5 — LeNet
// ============================================================
//   conv5(in→6) → ReLU → maxpool2
//   conv5(6→16) → ReLU → maxpool2
//   fc(16·s·s→120) → ReLU → fc(120→84) → ReLU → fc(84→classes)
//
// s depends on the input size: 4 for 28×28 (MNIST),
// 5 for 32×32 (CIFAR-10).

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig, Relu,
    },
    prelude::*,
};

use crate::domain::image::ImageShape;
use crate::ml::classifier::ImageClassifier;

#[derive(Config, Debug)]
pub struct LeNetConfig {
    pub input_channels: usize,
    /// Height/width of the (square) input image
    pub input_size:     usize,
    pub num_classes:    usize,
}

impl LeNetConfig {
    pub fn for_shape(shape: ImageShape, num_classes: usize) -> Self {
        Self::new(shape.channels, shape.height, num_classes)
    }

    /// Side length of the feature map entering the first dense layer.
    pub fn feature_size(&self) -> usize {
        (self.input_size.saturating_sub(4) / 2).saturating_sub(4) / 2
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> LeNet<B> {
        let s = self.feature_size();
        LeNet {
            conv1: Conv2dConfig::new([self.input_channels, 6], [5, 5]).init(device),
            conv2: Conv2dConfig::new([6, 16], [5, 5]).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            fc1: LinearConfig::new(16 * s * s, 120).init(device),
            fc2: LinearConfig::new(120, 84).init(device),
            fc3: LinearConfig::new(84, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct LeNet<B: Backend> {
    conv1:      Conv2d<B>,
    conv2:      Conv2d<B>,
    pool:       MaxPool2d,
    fc1:        Linear<B>,
    fc2:        Linear<B>,
    fc3:        Linear<B>,
    activation: Relu,
}

impl<B: Backend> ImageClassifier<B> for LeNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(self.activation.forward(self.conv1.forward(images)));
        let x = self.pool.forward(self.activation.forward(self.conv2.forward(x)));
        let x = x.flatten::<2>(1, 3);
        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.activation.forward(self.fc2.forward(x));
        self.fc3.forward(x)
    }
}

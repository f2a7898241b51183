// ============================================================
// Layer 5 — CIFAR ResNet
// ============================================================
// Residual networks sized for 32×32 inputs (He et al., 2015, §4.2):
//
//   conv3x3(in→16) → BN → ReLU
//   stage 1: k × BasicBlock(16)          32×32
//   stage 2: k × BasicBlock(32), stride 2 16×16
//   stage 3: k × BasicBlock(64), stride 2  8×8
//   global average pool → linear(64 → classes)
//
// The first block of stages 2 and 3 changes both resolution and
// width, so its shortcut cannot be the identity:
//   option A — subsample by the stride, then zero-pad planes/4
//              channels on each side (no parameters)
//   option B — 1×1 strided conv + BN
//
// Option A keeps the parameter counts of the paper:
//   resnet20 0.27M, resnet32 0.46M, resnet44 0.66M,
//   resnet56 0.85M, resnet110 1.7M, resnet1202 19.4M
//
// Reference: Burn Book §3 (Building Blocks)
//            He et al. (2015) Deep Residual Learning for Image Recognition

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        BatchNorm, BatchNormConfig, Initializer, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
};

use crate::domain::architecture::{Architecture, ShortcutKind};
use crate::ml::classifier::ImageClassifier;

/// He-normal (fan-in) initialisation used for every conv and linear weight.
fn kaiming_normal() -> Initializer {
    Initializer::KaimingNormal {
        gain: 2.0_f64.sqrt(),
        fan_out_only: false,
    }
}

/// Final linear layer: He-normal weight, Burn's default (fan-in uniform) bias.
fn classifier_head<B: Backend>(d_input: usize, d_output: usize, device: &B::Device) -> Linear<B> {
    let mut linear = LinearConfig::new(d_input, d_output).init(device);
    linear.weight =
        kaiming_normal().init_with([d_input, d_output], Some(d_input), Some(d_output), device);
    linear
}

// ─── ResNet ───────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Basic blocks in each of the three stages
    pub blocks_per_stage: usize,
    pub num_classes:      usize,
    #[config(default = 3)]
    pub input_channels:   usize,
    #[config(default = "ShortcutKind::A")]
    pub shortcut:         ShortcutKind,
}

impl ResNetConfig {
    /// Config for one of the named ResNets, or None for other architectures.
    pub fn for_arch(arch: Architecture, num_classes: usize) -> Option<Self> {
        let config = match arch {
            Architecture::Resnet20   => resnet20(num_classes),
            Architecture::Resnet32   => resnet32(num_classes),
            Architecture::Resnet44   => resnet44(num_classes),
            Architecture::Resnet56   => resnet56(num_classes),
            Architecture::Resnet110  => resnet110(num_classes),
            Architecture::Resnet1202 => resnet1202(num_classes),
            Architecture::LeNet | Architecture::Mlp => return None,
        };
        Some(config)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let mut in_planes = 16;
        let mut stage = |planes: usize, stride: usize| -> Vec<BasicBlock<B>> {
            let mut strides = vec![stride];
            strides.extend(std::iter::repeat(1).take(self.blocks_per_stage.saturating_sub(1)));
            strides
                .into_iter()
                .map(|s| {
                    let block = BasicBlockConfig::new(in_planes, planes)
                        .with_stride(s)
                        .with_shortcut(self.shortcut)
                        .init(device);
                    in_planes = planes;
                    block
                })
                .collect()
        };

        let layer1 = stage(16, 1);
        let layer2 = stage(32, 2);
        let layer3 = stage(64, 2);

        ResNet {
            conv1: conv3x3(self.input_channels, 16, 1).init(device),
            bn1: BatchNormConfig::new(16).init(device),
            layer1,
            layer2,
            layer3,
            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            linear: classifier_head(64, self.num_classes, device),
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    conv1:      Conv2d<B>,
    bn1:        BatchNorm<B, 2>,
    layer1:     Vec<BasicBlock<B>>,
    layer2:     Vec<BasicBlock<B>>,
    layer3:     Vec<BasicBlock<B>>,
    avgpool:    AdaptiveAvgPool2d,
    linear:     Linear<B>,
    activation: Relu,
}

impl<B: Backend> ResNet<B> {
    /// images: [batch, channels, 32, 32] → logits: [batch, classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.bn1.forward(self.conv1.forward(images)));

        let x = self.layer1.iter().fold(x, |x, block| block.forward(x));
        let x = self.layer2.iter().fold(x, |x, block| block.forward(x));
        let x = self.layer3.iter().fold(x, |x, block| block.forward(x));

        let x = self.avgpool.forward(x).flatten::<2>(1, 3);
        self.linear.forward(x)
    }
}

impl<B: Backend> ImageClassifier<B> for ResNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        ResNet::forward(self, images)
    }
}

// ─── BasicBlock ───────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct BasicBlockConfig {
    in_planes: usize,
    planes:    usize,
    #[config(default = 1)]
    stride:    usize,
    #[config(default = "ShortcutKind::A")]
    shortcut:  ShortcutKind,
}

impl BasicBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BasicBlock<B> {
        let needs_shortcut = self.stride != 1 || self.in_planes != self.planes;

        let (projection, pad_planes) = match (needs_shortcut, self.shortcut) {
            (false, _) => (None, 0),
            (true, ShortcutKind::A) => (None, self.planes / 4),
            (true, ShortcutKind::B) => (
                Some(ProjectionConfig::new(self.in_planes, self.planes, self.stride).init(device)),
                0,
            ),
        };

        BasicBlock {
            conv1: conv3x3(self.in_planes, self.planes, self.stride).init(device),
            bn1: BatchNormConfig::new(self.planes).init(device),
            conv2: conv3x3(self.planes, self.planes, 1).init(device),
            bn2: BatchNormConfig::new(self.planes).init(device),
            projection,
            pad_planes,
            subsample: if needs_shortcut { self.stride } else { 1 },
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    conv1:      Conv2d<B>,
    bn1:        BatchNorm<B, 2>,
    conv2:      Conv2d<B>,
    bn2:        BatchNorm<B, 2>,
    projection: Option<Projection<B>>,
    /// Zero channels added on each side by the option-A shortcut
    pad_planes: usize,
    /// Spatial stride of the option-A shortcut (1 = identity)
    subsample:  usize,
    activation: Relu,
}

impl<B: Backend> BasicBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let shortcut = match &self.projection {
            Some(proj) => proj.forward(x.clone()),
            None => pad_shortcut(x.clone(), self.subsample, self.pad_planes),
        };

        let out = self.activation.forward(self.bn1.forward(self.conv1.forward(x)));
        let out = self.bn2.forward(self.conv2.forward(out));

        self.activation.forward(out + shortcut)
    }
}

/// Option-A shortcut: keep every `stride`-th row and column, then add
/// `pad` zero channels before and after. With stride 1 and pad 0 this is
/// the identity.
pub fn pad_shortcut<B: Backend>(x: Tensor<B, 4>, stride: usize, pad: usize) -> Tensor<B, 4> {
    let device = x.device();
    let x = if stride > 1 {
        let [_, _, height, width] = x.dims();
        let rows = Tensor::<B, 1, Int>::arange_step(0..height as i64, stride, &device);
        let cols = Tensor::<B, 1, Int>::arange_step(0..width as i64, stride, &device);
        x.select(2, rows).select(3, cols)
    } else {
        x
    };

    if pad == 0 {
        return x;
    }

    let [batch, _, height, width] = x.dims();
    let zeros = Tensor::<B, 4>::zeros([batch, pad, height, width], &device);
    Tensor::cat(vec![zeros.clone(), x, zeros], 1)
}

// ─── Projection (option B) ────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct ProjectionConfig {
    in_planes:  usize,
    out_planes: usize,
    stride:     usize,
}

impl ProjectionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Projection<B> {
        Projection {
            conv: Conv2dConfig::new([self.in_planes, self.out_planes], [1, 1])
                .with_stride([self.stride, self.stride])
                .with_bias(false)
                .with_initializer(kaiming_normal())
                .init(device),
            bn: BatchNormConfig::new(self.out_planes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct Projection<B: Backend> {
    conv: Conv2d<B>,
    bn:   BatchNorm<B, 2>,
}

impl<B: Backend> Projection<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

fn conv3x3(in_planes: usize, out_planes: usize, stride: usize) -> Conv2dConfig {
    Conv2dConfig::new([in_planes, out_planes], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .with_initializer(kaiming_normal())
}

// ─── Named constructors ───────────────────────────────────────────────────────
// CIFAR-10 defaults: 3 input channels, option-A shortcuts.

pub fn resnet20(num_classes: usize) -> ResNetConfig {
    ResNetConfig::new(3, num_classes)
}

pub fn resnet32(num_classes: usize) -> ResNetConfig {
    ResNetConfig::new(5, num_classes)
}

pub fn resnet44(num_classes: usize) -> ResNetConfig {
    ResNetConfig::new(7, num_classes)
}

pub fn resnet56(num_classes: usize) -> ResNetConfig {
    ResNetConfig::new(9, num_classes)
}

pub fn resnet110(num_classes: usize) -> ResNetConfig {
    ResNetConfig::new(18, num_classes)
}

pub fn resnet1202(num_classes: usize) -> ResNetConfig {
    ResNetConfig::new(200, num_classes)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = resnet20(10).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        assert_eq!(model.forward(x).dims(), [2, 10]);
        assert_eq!(model.layer1.len() + model.layer2.len() + model.layer3.len(), 9);
    }

    #[test]
    fn test_option_b_forward_shape() {
        let device = Default::default();
        let model = ResNetConfig::new(1, 4)
            .with_shortcut(ShortcutKind::B)
            .init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device);
        assert_eq!(model.forward(x).dims(), [1, 4]);
    }

    #[test]
    fn test_pad_shortcut_subsamples_and_pads() {
        let device = Default::default();
        // 1 × 2 × 4 × 4 with values 0..32
        let x = Tensor::<TestBackend, 1>::from_floats(
            (0..32).map(|v| v as f32).collect::<Vec<_>>().as_slice(),
            &device,
        )
        .reshape([1, 2, 4, 4]);

        let y = pad_shortcut(x, 2, 1);
        assert_eq!(y.dims(), [1, 4, 2, 2]);

        let v: Vec<f32> = y.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        // padding channel, then channel 0 rows/cols 0 and 2, then channel 1, then padding
        assert_eq!(&v[0..4], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(&v[4..8], &[0.0, 2.0, 8.0, 10.0]);
        assert_eq!(&v[8..12], &[16.0, 18.0, 24.0, 26.0]);
        assert_eq!(&v[12..16], &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_identity_shortcut_is_untouched() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([1, 2, 3, 3], &device);
        assert_eq!(pad_shortcut(x, 1, 0).dims(), [1, 2, 3, 3]);
    }

    #[test]
    fn test_config_for_arch() {
        let cfg = ResNetConfig::for_arch(Architecture::Resnet56, 10).unwrap();
        assert_eq!(cfg.blocks_per_stage, 9);
        assert!(ResNetConfig::for_arch(Architecture::LeNet, 10).is_none());

        for arch in Architecture::RESNETS {
            let cfg = ResNetConfig::for_arch(arch, 10).unwrap();
            assert_eq!(Some(cfg.blocks_per_stage), arch.blocks_per_stage(), "{arch}");
        }
    }

    #[test]
    fn test_head_bias_keeps_default_init() {
        let device = Default::default();
        let head = classifier_head::<TestBackend>(64, 10, &device);
        assert_eq!(head.weight.dims(), [64, 10]);

        // fan-in uniform bound 1/sqrt(64)
        let bias: Vec<f32> = head
            .bias
            .unwrap()
            .val()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(bias.len(), 10);
        assert!(bias.iter().all(|b| b.abs() <= 0.125 + 1e-6));
    }
}

// ============================================================
// Layer 5 — Optimizer Configuration
// ============================================================
// Builds one of Burn's optimizers from a name and the shared
// hyperparameters:
//
//   sgd     — momentum (no dampening) + weight decay
//             v = μ·v + g + λ·θ ;  θ = θ - lr·v
//   adam    — Kingma & Ba (2015) + weight decay
//   adagrad — Duchi et al. (2011) + weight decay
//   rmsprop — Hinton (2012) with momentum + weight decay
//
// Each Burn optimizer is a different type, so the choice is made
// once here and the result is handed to an OptimizerRun, which is
// generic over any Optimizer. Training code implements OptimizerRun
// and so accepts a custom optimizer just as well as a built-in one.
//
// Reference: Burn Book §5 (Optimizers)

use burn::{
    module::AutodiffModule,
    optim::{
        decay::WeightDecayConfig, momentum::MomentumConfig, AdaGradConfig, AdamConfig,
        Optimizer, RmsPropConfig, SgdConfig,
    },
    tensor::backend::AutodiffBackend,
};

use crate::domain::optimizer::{OptimizerKind, OptimizerSettings};

/// Continuation that receives the configured optimizer.
pub trait OptimizerRun<B: AutodiffBackend, M: AutodiffModule<B>> {
    type Output;

    fn run<O: Optimizer<M, B>>(self, optim: O) -> Self::Output;
}

/// Build the optimizer named by `kind` and pass it to `run`.
pub fn configure_optimizer<B, M, R>(
    kind:     OptimizerKind,
    settings: &OptimizerSettings,
    run:      R,
) -> R::Output
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    R: OptimizerRun<B, M>,
{
    tracing::debug!(
        "Optimizer {} (momentum={}, weight_decay={})",
        kind, settings.momentum, settings.weight_decay
    );
    match kind {
        OptimizerKind::Sgd     => run.run(sgd::<B, M>(settings)),
        OptimizerKind::Adam    => run.run(adam::<B, M>(settings)),
        OptimizerKind::AdaGrad => run.run(adagrad::<B, M>(settings)),
        OptimizerKind::RmsProp => run.run(rmsprop::<B, M>(settings)),
    }
}

fn weight_decay(settings: &OptimizerSettings) -> Option<WeightDecayConfig> {
    (settings.weight_decay > 0.0).then(|| WeightDecayConfig::new(settings.weight_decay as f32))
}

pub fn sgd<B: AutodiffBackend, M: AutodiffModule<B>>(
    settings: &OptimizerSettings,
) -> impl Optimizer<M, B> {
    let momentum = (settings.momentum > 0.0).then(|| {
        MomentumConfig::new()
            .with_momentum(settings.momentum)
            .with_dampening(0.0)
    });
    SgdConfig::new()
        .with_momentum(momentum)
        .with_weight_decay(weight_decay(settings))
        .init::<B, M>()
}

pub fn adam<B: AutodiffBackend, M: AutodiffModule<B>>(
    settings: &OptimizerSettings,
) -> impl Optimizer<M, B> {
    AdamConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(weight_decay(settings))
        .init::<B, M>()
}

pub fn adagrad<B: AutodiffBackend, M: AutodiffModule<B>>(
    settings: &OptimizerSettings,
) -> impl Optimizer<M, B> {
    AdaGradConfig::new()
        .with_weight_decay(weight_decay(settings))
        .init::<B, M>()
}

pub fn rmsprop<B: AutodiffBackend, M: AutodiffModule<B>>(
    settings: &OptimizerSettings,
) -> impl Optimizer<M, B> {
    RmsPropConfig::new()
        .with_momentum(settings.momentum as f32)
        .with_weight_decay(weight_decay(settings))
        .init::<B, M>()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{
        classifier::ImageClassifier,
        flat_params::FlatParams,
        mlp::{Mlp, MlpConfig},
    };
    use burn::{
        backend::{Autodiff, NdArray},
        optim::GradientsParams,
        prelude::*,
    };

    type TestBackend = Autodiff<NdArray>;

    /// Takes one step on a fixed input and returns how far the
    /// parameters moved (sum of absolute differences).
    struct OneStep {
        model: Mlp<TestBackend>,
    }

    impl OptimizerRun<TestBackend, Mlp<TestBackend>> for OneStep {
        type Output = f32;

        fn run<O: Optimizer<Mlp<TestBackend>, TestBackend>>(self, mut optim: O) -> f32 {
            let device = Default::default();
            let before = self.model.flat_params().unwrap();

            let x = Tensor::<TestBackend, 4>::ones([2, 1, 2, 2], &device);
            let loss = self.model.forward(x).powf_scalar(2.0).mean();
            let grads = GradientsParams::from_grads(loss.backward(), &self.model);
            let model = optim.step(0.1, self.model, grads);

            let after = model.flat_params().unwrap();
            (after - before).abs().sum().into_scalar()
        }
    }

    #[test]
    fn test_every_optimizer_moves_the_weights() {
        let settings = OptimizerSettings::default();
        for kind in OptimizerKind::ALL {
            let model = MlpConfig::new(4, 3).with_hidden_dim(5).init(&Default::default());
            let moved = configure_optimizer(kind, &settings, OneStep { model });
            assert!(moved > 0.0, "{kind} did not update the parameters");
        }
    }

    #[test]
    fn test_zero_weight_decay_is_disabled() {
        let s = OptimizerSettings { momentum: 0.0, weight_decay: 0.0 };
        assert!(weight_decay(&s).is_none());
        assert!(weight_decay(&OptimizerSettings::default()).is_some());
    }
}

// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network, optimizer and training-loop code lives here.
//
//   classifier.rs  — ImageClassifier trait + ModelSpec
//   resnet.rs      — CIFAR ResNets (20 … 1202), options A and B
//   lenet.rs       — LeNet-5 for 28×28 and 32×32 inputs
//   mlp.rs         — fully connected baseline
//
//   flat_params.rs — any module ↔ one flat parameter vector
//   optimizer.rs   — sgd / adam / adagrad / rmsprop from a name
//   evaluator.rs   — loss + accuracy over a data loader
//   trainer.rs     — epoch loop, schedule, checkpoints, path
//   summary.rs     — parameter and layer counts
//   backend.rs     — wgpu / ndarray selection
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2015) Deep Residual Learning

/// Training backend selection
pub mod backend;

/// The trait every network implements
pub mod classifier;

/// CIFAR ResNet family
pub mod resnet;

/// LeNet-5
pub mod lenet;

/// Multi-layer perceptron
pub mod mlp;

/// Flatten and restore model parameters
pub mod flat_params;

/// Optimizer construction
pub mod optimizer;

/// Evaluation over a data loader
pub mod evaluator;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Parameter and layer counts
pub mod summary;

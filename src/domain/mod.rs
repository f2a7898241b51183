// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that name the concepts of the harness:
// which network to build, which optimizer to use, how the
// learning rate moves over epochs, and what an image sample is.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// Network architecture labels (resnet20 … resnet1202, lenet, mlp)
pub mod architecture;

/// Optimizer selection by name
pub mod optimizer;

/// Step-decay learning-rate schedule with optional warm-up
pub mod schedule;

/// Image samples, shapes, and dataset descriptors
pub mod image;

/// Core abstractions (traits) that other layers implement
pub mod traits;

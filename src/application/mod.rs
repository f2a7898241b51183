// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one user-facing goal (train, sweep, evaluate, fetch weights).
//
// Rules for this layer:
//   - No model or tensor code here
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// A single training run
pub mod train_use_case;

// Architecture × optimizer × lr grid of training runs
pub mod sweep_use_case;

// Test-set evaluation of a finished run
pub mod evaluate_use_case;

// Pretrained model listing and download
pub mod pretrained_use_case;

// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or the network on
// behalf of the other layers:
//
//   checkpoint.rs — model weights (CompactRecorder), best and
//                   latest pointers, train_config.json
//
//   metrics.rs    — one CSV row per epoch
//
//   optim_path.rs — flat-parameter snapshots as JSON lines
//
//   pretrained.rs — download table for trained ResNets,
//                   fetched with reqwest and checked by SHA-256
//
//   run_log.rs    — per-run log file next to the console output
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Optimization path recorder
pub mod optim_path;

/// Pretrained model table and downloader
pub mod pretrained;

/// Scoped console + file logging for one run
pub mod run_log;

// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from files on disk to normalised tensor batches.
//
//   CIFAR-10 .bin batches / Burn MNIST
//       │
//       ▼
//   Cifar10Loader / MnistLoader → Vec<ImageRecord> (u8, CHW)
//       │
//       ▼
//   split_train_val             → optional held-out fraction
//       │
//       ▼
//   ImageDataset                → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher                → crop/flip (train only), normalise,
//       │                         stack into [N, C, H, W]
//       ▼
//   DataLoader                  → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the CIFAR-10 binary format
pub mod cifar;

/// Adapts Burn's MNIST dataset to ImageRecords
pub mod mnist;

/// Implements Burn's Dataset trait for image records
pub mod dataset;

/// Random crop + horizontal flip for training batches
pub mod augment;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;

use crate::domain::{image::DatasetKind, traits::ImageSource};

/// Pick the loader for a dataset kind.
pub fn source_for(kind: DatasetKind, data_dir: &str) -> Box<dyn ImageSource> {
    match kind {
        DatasetKind::Cifar10 => Box::new(cifar::Cifar10Loader::new(data_dir)),
        DatasetKind::Mnist   => Box::new(mnist::MnistLoader::new()),
    }
}

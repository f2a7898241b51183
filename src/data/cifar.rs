// ============================================================
// Layer 4 — CIFAR-10 Loader
// ============================================================
// Reads the "binary version" of CIFAR-10 as distributed by the
// dataset authors (cifar-10-batches-bin/).
//
// File layout: a flat sequence of 3073-byte records:
//   byte 0        → label (0..=9)
//   bytes 1..1025 → red plane,   32×32 row-major
//   bytes ..2049  → green plane
//   bytes ..3073  → blue plane
//
// So the pixel bytes are already in CHW order and are kept as-is.
//
//   train split → data_batch_1.bin … data_batch_5.bin (50 000 images)
//   test split  → test_batch.bin                      (10 000 images)

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::{
    image::{ImageRecord, ImageShape, Split},
    traits::ImageSource,
};

pub const CIFAR10_CLASSES: [&str; 10] = [
    "airplane", "automobile", "bird", "cat", "deer",
    "dog", "frog", "horse", "ship", "truck",
];

const PIXELS_PER_IMAGE: usize = 3 * 32 * 32;
const RECORD_LEN: usize = 1 + PIXELS_PER_IMAGE;

pub struct Cifar10Loader {
    dir: PathBuf,
}

impl Cifar10Loader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn files(&self, split: Split) -> Vec<PathBuf> {
        match split {
            Split::Train => (1..=5)
                .map(|i| self.dir.join(format!("data_batch_{i}.bin")))
                .collect(),
            Split::Test => vec![self.dir.join("test_batch.bin")],
        }
    }
}

impl ImageSource for Cifar10Loader {
    fn shape(&self) -> ImageShape {
        ImageShape::new(3, 32, 32)
    }

    fn load(&self, split: Split) -> Result<Vec<ImageRecord>> {
        let mut records = Vec::new();
        for path in self.files(split) {
            let bytes = fs::read(&path).with_context(|| {
                format!(
                    "Cannot read CIFAR-10 batch '{}'. Download the binary version \
                     and pass its directory with --data-dir.",
                    path.display()
                )
            })?;
            let batch = parse_batch(&bytes)
                .with_context(|| format!("Malformed CIFAR-10 batch '{}'", path.display()))?;
            tracing::debug!("Read {} images from '{}'", batch.len(), path.display());
            records.extend(batch);
        }
        tracing::info!("Loaded {} CIFAR-10 images ({:?} split)", records.len(), split);
        Ok(records)
    }
}

/// Decode one in-memory CIFAR-10 batch file.
pub fn parse_batch(bytes: &[u8]) -> Result<Vec<ImageRecord>> {
    if bytes.len() % RECORD_LEN != 0 {
        bail!(
            "{} bytes is not a whole number of {}-byte records",
            bytes.len(),
            RECORD_LEN
        );
    }

    bytes
        .chunks_exact(RECORD_LEN)
        .enumerate()
        .map(|(i, rec)| {
            let label = rec[0] as usize;
            if label >= CIFAR10_CLASSES.len() {
                bail!("record {i} has label {label}, expected 0..=9");
            }
            Ok(ImageRecord::new(rec[1..].to_vec(), label))
        })
        .collect()
}

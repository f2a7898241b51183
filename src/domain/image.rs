// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// A sample is a flat CHW byte buffer plus an integer class
// label. Pixel bytes stay as u8 until batching so the full
// CIFAR-10 training set fits in memory (50 000 × 3072 bytes).

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Channel/height/width of every image in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
}

impl ImageShape {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self { channels, height, width }
    }

    /// Total number of values in one image (C × H × W).
    pub fn num_pixels(&self) -> usize {
        self.channels * self.height * self.width
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.channels, self.height, self.width)
    }
}

/// One labelled image, pixels in CHW order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub pixels: Vec<u8>,
    pub label:  usize,
}

impl ImageRecord {
    pub fn new(pixels: Vec<u8>, label: usize) -> Self {
        Self { pixels, label }
    }
}

/// Which half of a dataset to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

/// Datasets the harness knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Cifar10,
    Mnist,
}

impl DatasetKind {
    pub fn image_shape(&self) -> ImageShape {
        match self {
            DatasetKind::Cifar10 => ImageShape::new(3, 32, 32),
            DatasetKind::Mnist   => ImageShape::new(1, 28, 28),
        }
    }

    pub fn num_classes(&self) -> usize {
        10
    }

    /// Per-channel mean of the training set, on the [0, 1] scale.
    pub fn mean(&self) -> &'static [f32] {
        match self {
            DatasetKind::Cifar10 => &[0.4914, 0.4822, 0.4465],
            DatasetKind::Mnist   => &[0.1307],
        }
    }

    /// Per-channel standard deviation of the training set.
    pub fn std(&self) -> &'static [f32] {
        match self {
            DatasetKind::Cifar10 => &[0.2470, 0.2435, 0.2616],
            DatasetKind::Mnist   => &[0.3081],
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Cifar10 => f.write_str("cifar10"),
            DatasetKind::Mnist   => f.write_str("mnist"),
        }
    }
}

impl FromStr for DatasetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cifar10" | "cifar-10" => Ok(DatasetKind::Cifar10),
            "mnist"                => Ok(DatasetKind::Mnist),
            other => bail!("unknown dataset '{other}', expected cifar10 or mnist"),
        }
    }
}

// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer asks for images through ImageSource and
// never learns whether they came from CIFAR binary batches or
// from Burn's MNIST download.

use anyhow::Result;

use crate::domain::image::{ImageRecord, ImageShape, Split};

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can load a labelled image split.
///
/// Implementations:
///   - Cifar10Loader → reads the CIFAR-10 binary batches from disk
///   - MnistLoader   → wraps Burn's MNIST dataset
pub trait ImageSource {
    /// Shape shared by every record this source returns.
    fn shape(&self) -> ImageShape;

    /// Load every record of the given split.
    fn load(&self, split: Split) -> Result<Vec<ImageRecord>>;
}

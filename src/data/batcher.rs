// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<ImageRecord>
// into a normalised image tensor plus a label tensor.
//
// How batching works here:
//   Input:  N records, each a C×H×W byte buffer
//   Output: images [N, C, H, W] (f32), targets [N] (int)
//
//   Every byte becomes (x / 255 - mean[c]) / std[c], all samples
//   are written into one flat Vec, then reshaped.
//
// The training batcher also applies random crop + flip; the
// validation batcher leaves images untouched. Crops and flips come
// from one seeded StdRng shared by every clone of the batcher, so a
// run with the same seed and a single loader thread sees the same
// augmented batches.
//
// Reference: Burn Book §4 (Batcher)

use std::sync::{Arc, Mutex};

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::data::augment::{random_crop_flip, CIFAR_PAD};
use crate::domain::image::{DatasetKind, ImageRecord, ImageShape};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
/// A batch of images ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Normalised pixels, shape [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// Ground truth class labels, shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
    shape:      ImageShape,
    mean:       Vec<f32>,
    std:        Vec<f32>,
    augment:    bool,
    rng:        Arc<Mutex<StdRng>>,
}

impl<B: Backend> ImageBatcher<B> {
    /// Batcher with the dataset's shape and normalisation, no augmentation.
    pub fn new(device: B::Device, dataset: DatasetKind) -> Self {
        Self {
            device,
            shape:   dataset.image_shape(),
            mean:    dataset.mean().to_vec(),
            std:     dataset.std().to_vec(),
            augment: false,
            rng:     Arc::new(Mutex::new(StdRng::seed_from_u64(0))),
        }
    }

    /// Seed the augmentation stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    /// Turn random crop + flip on or off.
    pub fn with_augmentation(mut self, augment: bool) -> Self {
        self.augment = augment;
        self
    }

    fn normalise_into(&self, pixels: &[u8], out: &mut Vec<f32>) {
        let plane = self.shape.height * self.shape.width;
        for (i, &p) in pixels.iter().enumerate() {
            let c = i / plane;
            out.push((p as f32 / 255.0 - self.mean[c]) / self.std[c]);
        }
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<ImageRecord, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageRecord>) -> ImageBatch<B> {
        let batch_size = items.len();
        let ImageShape { channels, height, width } = self.shape;

        let mut flat: Vec<f32> = Vec::with_capacity(batch_size * self.shape.num_pixels());
        if self.augment {
            // A panicked loader thread leaves the generator usable
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            for item in &items {
                let cropped = random_crop_flip(&item.pixels, self.shape, CIFAR_PAD, &mut *rng);
                self.normalise_into(&cropped, &mut flat);
            }
        } else {
            for item in &items {
                self.normalise_into(&item.pixels, &mut flat);
            }
        }

        let labels: Vec<i32> = items.iter().map(|r| r.label as i32).collect();

        let images = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, channels, height, width]);
        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_labels() {
        let batcher = ImageBatcher::<TestBackend>::new(Default::default(), DatasetKind::Cifar10);
        let items = vec![
            ImageRecord::new(vec![0; 3072], 1),
            ImageRecord::new(vec![255; 3072], 7),
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 3, 32, 32]);
        let labels: Vec<i64> = batch
            .targets
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .unwrap();
        assert_eq!(labels, vec![1, 7]);
    }

    #[test]
    fn test_normalisation_per_channel() {
        let batcher = ImageBatcher::<TestBackend>::new(Default::default(), DatasetKind::Mnist);
        let batch = batcher.batch(vec![ImageRecord::new(vec![255; 784], 0)]);
        let values: Vec<f32> = batch.images.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        let expected = (1.0 - 0.1307) / 0.3081;
        assert!(values.iter().all(|v| (v - expected).abs() < 1e-4));
    }

    fn varied_records(n: usize) -> Vec<ImageRecord> {
        (0..n)
            .map(|k| ImageRecord::new((0..3072).map(|i| ((i * 7 + k * 13) % 251) as u8).collect(), k % 10))
            .collect()
    }

    fn augmented(seed: u64) -> Vec<f32> {
        let batcher = ImageBatcher::<TestBackend>::new(Default::default(), DatasetKind::Cifar10)
            .with_augmentation(true)
            .with_seed(seed);
        let first = batcher.batch(varied_records(8));
        let second = batcher.batch(varied_records(8));
        let mut values = first.images.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        values.extend(second.images.into_data().convert::<f32>().to_vec::<f32>().unwrap());
        values
    }

    #[test]
    fn test_same_seed_same_augmentation() {
        assert_eq!(augmented(7), augmented(7));
        assert_ne!(augmented(7), augmented(8));
    }
}

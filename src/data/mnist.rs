// ============================================================
// Layer 4 — MNIST Loader
// ============================================================
// Burn ships MNIST (downloaded and cached on first use). Its
// items hold 28×28 f32 pixels in 0..=255; they are converted
// back to single-channel u8 records so both datasets share one
// batching path.

use anyhow::Result;
use burn::data::dataset::{
    vision::{MnistDataset, MnistItem},
    Dataset,
};

use crate::domain::{
    image::{ImageRecord, ImageShape, Split},
    traits::ImageSource,
};

#[derive(Debug, Default)]
pub struct MnistLoader;

impl MnistLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageSource for MnistLoader {
    fn shape(&self) -> ImageShape {
        ImageShape::new(1, 28, 28)
    }

    fn load(&self, split: Split) -> Result<Vec<ImageRecord>> {
        let dataset = match split {
            Split::Train => MnistDataset::train(),
            Split::Test  => MnistDataset::test(),
        };
        let records: Vec<ImageRecord> = dataset.iter().map(to_record).collect();
        tracing::info!("Loaded {} MNIST images ({:?} split)", records.len(), split);
        Ok(records)
    }
}

fn to_record(item: MnistItem) -> ImageRecord {
    let pixels = item
        .image
        .iter()
        .flat_map(|row| row.iter().map(|&p| p.clamp(0.0, 255.0) as u8))
        .collect();
    ImageRecord::new(pixels, item.label as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_conversion_is_row_major() {
        let mut image = [[0.0f32; 28]; 28];
        image[0][1] = 255.0;
        image[1][0] = 7.0;
        let rec = to_record(MnistItem { image, label: 4 });
        assert_eq!(rec.label, 4);
        assert_eq!(rec.pixels.len(), 784);
        assert_eq!(rec.pixels[1], 255);
        assert_eq!(rec.pixels[28], 7);
    }
}

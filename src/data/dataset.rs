use burn::data::dataset::Dataset;

use crate::domain::image::ImageRecord;

pub struct ImageDataset {
    records: Vec<ImageRecord>,
}

impl ImageDataset {
    pub fn new(records: Vec<ImageRecord>) -> Self { Self { records } }
}

impl Dataset<ImageRecord> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageRecord> {
        self.records.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_index() {
        let ds = ImageDataset::new(vec![
            ImageRecord::new(vec![1], 0),
            ImageRecord::new(vec![2], 2),
            ImageRecord::new(vec![3], 2),
        ]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(1).unwrap().pixels, vec![2]);
        assert!(ds.get(3).is_none());
    }
}

// ============================================================
// Layer 4 — Training Augmentation
// ============================================================
// The standard CIFAR recipe:
//   1. zero-pad every side by `pad` pixels
//   2. take a random H×W crop of the padded image
//   3. mirror it left↔right with probability 0.5
//
// Done directly on the CHW byte buffer, without materialising
// the padded image.

use rand::Rng;

use crate::domain::image::ImageShape;

pub const CIFAR_PAD: usize = 4;

/// Random crop (after zero padding) followed by a random horizontal flip.
pub fn random_crop_flip<R: Rng + ?Sized>(
    pixels: &[u8],
    shape:  ImageShape,
    pad:    usize,
    rng:    &mut R,
) -> Vec<u8> {
    let dy   = rng.gen_range(0..=2 * pad);
    let dx   = rng.gen_range(0..=2 * pad);
    let flip = rng.gen_bool(0.5);
    crop_flip(pixels, shape, pad, dy, dx, flip)
}

/// Deterministic core of `random_crop_flip`: the crop window starts at
/// (dy, dx) in padded coordinates.
pub fn crop_flip(
    pixels: &[u8],
    shape:  ImageShape,
    pad:    usize,
    dy:     usize,
    dx:     usize,
    flip:   bool,
) -> Vec<u8> {
    let ImageShape { channels, height, width } = shape;
    let mut out = vec![0u8; shape.num_pixels()];

    for c in 0..channels {
        let plane = c * height * width;
        for y in 0..height {
            let sy = (y + dy) as isize - pad as isize;
            if sy < 0 || sy >= height as isize {
                continue;
            }
            for x in 0..width {
                let cx = if flip { width - 1 - x } else { x };
                let sx = (cx + dx) as isize - pad as isize;
                if sx < 0 || sx >= width as isize {
                    continue;
                }
                out[plane + y * width + x] =
                    pixels[plane + sy as usize * width + sx as usize];
            }
        }
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn ramp(shape: ImageShape) -> Vec<u8> {
        (0..shape.num_pixels()).map(|i| i as u8).collect()
    }

    #[test]
    fn test_centre_crop_without_flip_is_identity() {
        let shape = ImageShape::new(2, 3, 4);
        let img = ramp(shape);
        assert_eq!(crop_flip(&img, shape, 2, 2, 2, false), img);
    }

    #[test]
    fn test_flip_mirrors_rows() {
        let shape = ImageShape::new(1, 1, 4);
        let out = crop_flip(&[1, 2, 3, 4], shape, 0, 0, 0, true);
        assert_eq!(out, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_shift_fills_with_zeros() {
        let shape = ImageShape::new(1, 2, 2);
        // window starts at padded (0, 0) → shifted down-right by one
        let out = crop_flip(&[1, 2, 3, 4], shape, 1, 0, 0, false);
        assert_eq!(out, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_random_keeps_size() {
        let shape = ImageShape::new(3, 32, 32);
        let img = ramp(shape);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(random_crop_flip(&img, shape, CIFAR_PAD, &mut rng).len(), 3072);
        }
    }
}

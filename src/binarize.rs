//! Adaptive binarization.
//! Each pixel is compared against the box-filtered mean of its neighbourhood,
//! which suppresses anti-aliasing fringes and keeps glyph cores.

use image::{GrayImage, Luma};
use imageproc::filter::box_filter;

/// Two-level foreground/background bitmap with the dimensions of its source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryImage {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        let idx = self.index(x, y);
        self.bits[idx] = foreground;
    }

    /// Row-major backing store, one entry per pixel.
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn foreground_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Renders foreground as white on black, for debug dumps.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Thresholds `grey` against its local mean over a `(2r+1)²` box.
///
/// A pixel is foreground when it is darker than its neighbourhood mean by more
/// than `luminescence_threshold`, or lighter by more than that when `invert`
/// is set (light text on a dark background).
pub fn binarize(
    grey: &GrayImage,
    smoothing_radius: u32,
    luminescence_threshold: u32,
    invert: bool,
) -> BinaryImage {
    let (width, height) = grey.dimensions();
    let mut binary = BinaryImage::new(width, height);
    if binary.is_empty() {
        return binary;
    }

    let smoothed = box_filter(grey, smoothing_radius, smoothing_radius);
    let threshold = luminescence_threshold as i32;

    for (x, y, pixel) in grey.enumerate_pixels() {
        let value = i32::from(pixel.0[0]);
        let mean = i32::from(smoothed.get_pixel(x, y).0[0]);
        let contrast = if invert { value - mean } else { mean - value };
        if contrast > threshold {
            binary.set(x, y, true);
        }
    }

    binary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey_with_block(w: u32, h: u32, bg: u8, fg: u8, block: (u32, u32, u32, u32)) -> GrayImage {
        let (bx, by, bw, bh) = block;
        GrayImage::from_fn(w, h, |x, y| {
            if x >= bx && x < bx + bw && y >= by && y < by + bh {
                Luma([fg])
            } else {
                Luma([bg])
            }
        })
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let binary = binarize(&GrayImage::new(0, 0), 2, 40, false);
        assert!(binary.is_empty());
        assert_eq!(binary.foreground_count(), 0);
    }

    #[test]
    fn test_uniform_image_has_no_foreground() {
        let grey = GrayImage::from_pixel(16, 16, Luma([128]));
        assert_eq!(binarize(&grey, 2, 40, false).foreground_count(), 0);
        assert_eq!(binarize(&grey, 2, 40, true).foreground_count(), 0);
    }

    #[test]
    fn test_dark_block_on_light_background() {
        let grey = grey_with_block(20, 16, 240, 0, (8, 5, 3, 5));
        let binary = binarize(&grey, 2, 40, false);
        assert_eq!(binary.foreground_count(), 15);
        assert!(binary.get(8, 5));
        assert!(binary.get(10, 9));
        assert!(!binary.get(7, 5));
        assert!(!binary.get(11, 9));
    }

    #[test]
    fn test_polarity_flip_selects_light_glyphs() {
        let grey = grey_with_block(20, 16, 20, 230, (8, 5, 3, 5));
        let inverted = binarize(&grey, 2, 40, true);
        assert_eq!(inverted.foreground_count(), 15);
        assert!(inverted.get(9, 7));

        // Wrong polarity only picks up the dark halo around the glyph.
        let regular = binarize(&grey, 2, 40, false);
        assert!(!regular.get(9, 7));
        assert!(!regular.get(0, 0));
    }

    #[test]
    fn test_low_contrast_is_ignored() {
        let grey = grey_with_block(20, 16, 200, 180, (8, 5, 3, 5));
        assert_eq!(binarize(&grey, 2, 40, false).foreground_count(), 0);
    }

    #[test]
    fn test_debug_image_matches_bits() {
        let mut binary = BinaryImage::new(3, 2);
        binary.set(2, 1, true);
        let img = binary.to_image();
        assert_eq!(img.get_pixel(2, 1).0[0], 255);
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
    }
}

//! Greyscale conversion and polarity guess.

use image::{GrayImage, Pixel, RgbImage};

/// Upper bound of the luminance scale; greyscale values lie in `[0, RANGE]`.
pub const RANGE: u32 = 255;

/// Converts a colour screenshot to per-pixel luminance.
pub fn to_greyscale(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Guesses whether the text is light-on-dark.
///
/// The background dominates any text region, so a mean luminance below half
/// of the range means the background is dark and glyphs are lighter than it.
pub fn is_inverted(image: &RgbImage) -> bool {
    let pixels = u64::from(image.width()) * u64::from(image.height());
    if pixels == 0 {
        return false;
    }
    let sum: u64 = image
        .pixels()
        .map(|p| u64::from(p.to_luma().0[0]))
        .sum();
    sum * 2 < u64::from(RANGE) * pixels
}

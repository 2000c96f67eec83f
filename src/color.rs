//! Colour comparison with a per-channel tolerance.
//! Screenshots of the same pixel can jitter by a few levels between captures
//! (subpixel rendering, colour management), so exact equality is too strict.

use image::Rgb;

/// Default per-channel tolerance used when sampling background and cursor pixels.
pub const DEFAULT_TOLERANCE: u8 = 3;

/// Returns true if every RGB channel of `c1` and `c2` differs by at most `tolerance`.
pub fn colors_equal(c1: Rgb<u8>, c2: Rgb<u8>, tolerance: u8) -> bool {
    c1.0.iter()
        .zip(c2.0.iter())
        .all(|(a, b)| a.abs_diff(*b) <= tolerance)
}

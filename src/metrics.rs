//! Metrics extraction from a recognised character sequence.
//! Produces the pixel coordinates and pitch the latency sampler polls later,
//! plus the background colour and cursor style it compares against.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::color::colors_equal;
use crate::regions::Region;

/// Integer pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Calibrated geometry of a monospaced text line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Centre of the first newly typed character.
    pub anchor: Point,
    /// Horizontal distance between adjacent character cells.
    pub pitch: f64,
    /// Number of character cells that fit on the visible line.
    pub line_length: u32,
    #[serde(with = "hex_color")]
    pub background: Rgb<u8>,
    pub block_cursor: bool,
}

/// Computes [`Metrics`] from a left-to-right `sequence` of at least two
/// regions found in `image`.
///
/// `offset` is the number of character cells past the anchor at which the
/// free-line scan starts. `tolerance` applies to the cursor check only; the
/// free-line scan requires the exact background colour. Returns `None` when a
/// required sample lies outside the image.
pub fn metrics_from(
    sequence: &[Region],
    image: &RgbImage,
    offset: usize,
    tolerance: u8,
) -> Option<Metrics> {
    let (first, last) = match sequence {
        [first, .., last] => (first, last),
        _ => return None,
    };

    let (x1, y1) = (first.center_x(), first.center_y());
    let (x2, y2) = (last.center_x(), last.center_y());
    let pitch = (x2 - x1) / (sequence.len() - 1) as f64;

    let anchor = Point {
        x: round_half_up(x1),
        y: round_half_up(y1),
    };

    let Some(background) = sample(image, x2 + pitch * 2.0, y2) else {
        log::warn!(
            "background sample at ({:.1}, {:.1}) is outside the image",
            x2 + pitch * 2.0,
            y2
        );
        return None;
    };
    let Some(cursor) = sample(image, x2 + pitch, y2) else {
        log::warn!("cursor sample at ({:.1}, {:.1}) is outside the image", x2 + pitch, y2);
        return None;
    };
    let block_cursor = !colors_equal(cursor, background, tolerance);

    let start = Point {
        x: anchor.x + round_half_up(pitch * offset as f64),
        y: anchor.y,
    };
    let available = uniform_length_from(image, start, background);

    let cells = (f64::from(available) / pitch).floor() as i64 - i64::from(block_cursor);
    let line_length = (cells + offset as i64 - 1).max(0) as u32;

    log::debug!(
        "anchor {:?}, pitch {:.3}, {} free px, line length {}, block cursor {}",
        anchor,
        pitch,
        available,
        line_length,
        block_cursor
    );

    Some(Metrics {
        anchor,
        pitch,
        line_length,
        background,
        block_cursor,
    })
}

/// Length of the run of exactly-`color` pixels starting at `point` and going right.
fn uniform_length_from(image: &RgbImage, point: Point, color: Rgb<u8>) -> u32 {
    let width = i64::from(image.width());
    let height = i64::from(image.height());
    if point.x < 0 || point.y < 0 || point.y >= height {
        return 0;
    }

    let y = point.y as u32;
    (point.x..width)
        .take_while(|&x| *image.get_pixel(x as u32, y) == color)
        .count() as u32
}

fn sample(image: &RgbImage, x: f64, y: f64) -> Option<Rgb<u8>> {
    let x = u32::try_from(round_half_up(x)).ok()?;
    let y = u32::try_from(round_half_up(y)).ok()?;
    image.get_pixel_checked(x, y).copied()
}

/// Rounds halves towards positive infinity, so `-0.5` becomes `0`.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Serialises a colour as `#rrggbb`.
mod hex_color {
    use image::Rgb;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(color: &Rgb<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        let [r, g, b] = color.0;
        serializer.serialize_str(&format!("#{:02x}{:02x}{:02x}", r, g, b))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let hex = text
            .strip_prefix('#')
            .filter(|h| h.len() == 6)
            .ok_or_else(|| D::Error::custom(format!("expected #rrggbb, got '{}'", text)))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| D::Error::custom(format!("invalid colour '{}': {}", text, e)))
        };
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

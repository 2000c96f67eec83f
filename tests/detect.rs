//! End-to-end detection over synthetic screenshots.

use cursor_metrics::{Detector, DetectorParams, Point, detect};
use image::{Rgb, RgbImage};

const LIGHT: Rgb<u8> = Rgb([240, 240, 240]);
const INK: Rgb<u8> = Rgb([20, 20, 20]);

fn fill(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for yy in y..y + h {
        for xx in x..x + w {
            image.put_pixel(xx, yy, color);
        }
    }
}

fn glyphs(image: &mut RgbImage, xs: &[u32], y: u32, color: Rgb<u8>) {
    for &x in xs {
        fill(image, x, y, 3, 5, color);
    }
}

/// 100x20 line with five existing characters; `after` adds three more.
fn typed_pair(bg: Rgb<u8>, ink: Rgb<u8>) -> (RgbImage, RgbImage) {
    let mut before = RgbImage::from_pixel(100, 20, bg);
    glyphs(&mut before, &[10, 16, 22, 28, 34], 6, ink);
    let mut after = before.clone();
    glyphs(&mut after, &[40, 46, 52], 6, ink);
    (before, after)
}

#[test]
fn test_detects_typed_characters() {
    let (before, after) = typed_pair(LIGHT, INK);
    let metrics = detect(&before, &after, 3).unwrap().expect("no metrics");

    assert_eq!(metrics.anchor, Point { x: 41, y: 8 });
    assert_eq!(metrics.pitch, 6.0);
    assert_eq!(metrics.background, LIGHT);
    assert!(!metrics.block_cursor);
    // 23 free px from x=77 hold 3 cells, plus the 6-cell offset minus one.
    assert_eq!(metrics.line_length, 8);
}

#[test]
fn test_detects_light_text_on_dark_background() {
    let dark = Rgb([30, 30, 40]);
    let (before, after) = typed_pair(dark, Rgb([220, 220, 220]));
    let metrics = detect(&before, &after, 3).unwrap().expect("no metrics");

    assert_eq!(metrics.anchor, Point { x: 41, y: 8 });
    assert_eq!(metrics.pitch, 6.0);
    assert_eq!(metrics.background, dark);
}

#[test]
fn test_falls_back_to_opposite_polarity() {
    // Mostly dark screen, so the guess is light-on-dark, but the typed line
    // sits in a light band with dark text.
    let mut before = RgbImage::from_pixel(100, 20, LIGHT);
    fill(&mut before, 0, 0, 100, 13, Rgb([20, 20, 20]));
    let mut after = before.clone();
    glyphs(&mut after, &[40, 46, 52], 14, INK);

    let metrics = detect(&before, &after, 3).unwrap().expect("no metrics");
    assert_eq!(metrics.anchor, Point { x: 41, y: 16 });
    assert_eq!(metrics.pitch, 6.0);
    assert_eq!(metrics.background, LIGHT);
}

#[test]
fn test_block_cursor_is_reported() {
    let (mut before, mut after) = typed_pair(LIGHT, INK);
    // Full-cell cursor, too tall to pass the glyph filter itself. Before
    // typing it covers the cell of the first new character.
    fill(&mut before, 39, 2, 6, 13, INK);
    fill(&mut after, 57, 2, 6, 13, INK);

    let metrics = detect(&before, &after, 3).unwrap().expect("no metrics");
    assert_eq!(metrics.anchor, Point { x: 41, y: 8 });
    assert!(metrics.block_cursor);
    assert_eq!(metrics.line_length, 7);
}

#[test]
fn test_cursor_sample_within_tolerance_is_not_block() {
    let (before, mut after) = typed_pair(LIGHT, INK);
    after.put_pixel(59, 8, Rgb([243, 240, 240]));
    let metrics = detect(&before, &after, 3).unwrap().expect("no metrics");
    assert!(!metrics.block_cursor);
}

#[test]
fn test_cursor_sample_past_tolerance_is_block() {
    let (before, mut after) = typed_pair(LIGHT, INK);
    after.put_pixel(59, 8, Rgb([244, 240, 240]));
    let metrics = detect(&before, &after, 3).unwrap().expect("no metrics");
    assert!(metrics.block_cursor);
}

#[test]
fn test_detects_large_solid_glyphs() {
    // 10x10 is the largest square cell the default area filter admits.
    let before = RgbImage::from_pixel(160, 20, LIGHT);
    let mut after = before.clone();
    for x in [20, 34, 48] {
        fill(&mut after, x, 5, 10, 10, INK);
    }

    let metrics = detect(&before, &after, 3).unwrap().expect("no metrics");
    assert_eq!(metrics.anchor, Point { x: 24, y: 9 });
    assert_eq!(metrics.pitch, 14.0);
    assert!(!metrics.block_cursor);
    // Scan from x=108 over 52 px: 3 cells, plus the 6-cell offset minus one.
    assert_eq!(metrics.line_length, 8);
}

#[test]
fn test_bottom_most_sequence_wins() {
    let mut before = RgbImage::from_pixel(100, 40, LIGHT);
    glyphs(&mut before, &[10], 6, INK);
    let mut after = before.clone();
    glyphs(&mut after, &[20, 26, 32], 6, INK);
    glyphs(&mut after, &[10, 16, 22], 26, INK);

    let metrics = detect(&before, &after, 3).unwrap().expect("no metrics");
    assert_eq!(metrics.anchor, Point { x: 11, y: 28 });
}

#[test]
fn test_wrong_count_finds_nothing() {
    let (before, after) = typed_pair(LIGHT, INK);
    assert_eq!(detect(&before, &after, 4).unwrap(), None);
}

#[test]
fn test_tall_glyphs_are_filtered_out() {
    // 3x8 cells exceed the default 2.0 aspect ratio.
    let before = RgbImage::from_pixel(100, 20, LIGHT);
    let mut after = before.clone();
    for x in [40, 46, 52] {
        fill(&mut after, x, 6, 3, 8, INK);
    }
    assert_eq!(detect(&before, &after, 3).unwrap(), None);

    let params = DetectorParams {
        max_aspect_ratio: 3.0,
        ..DetectorParams::default()
    };
    let metrics = Detector::new(params)
        .detect(&before, &after, 3)
        .unwrap()
        .expect("no metrics");
    assert_eq!(metrics.anchor, Point { x: 41, y: 9 });
    assert_eq!(metrics.pitch, 6.0);
}

#[test]
fn test_detection_is_deterministic() {
    let (before, after) = typed_pair(LIGHT, INK);
    let mut detector = Detector::default();
    let first = detector.detect(&before, &after, 3).unwrap();
    let second = detector.detect(&before, &after, 3).unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(first, detect(&before, &after, 3).unwrap());
}

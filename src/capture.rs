//! Screen capture module
//! Uses `xcap` for cross-platform screenshots of the primary display.
//! Crops to the configured text region and converts to RGB8.
//! Debug: set `DEBUG_CAPTURE=1` to save each crop to `screenshots/debug_<label>.png`
//! and, via [`dump_bitmaps`], the binarized bitmaps the detector sees.
//! Permissions note: On macOS, grant "Screen & System Audio Recording" permission to the terminal in System Settings > Privacy & Security.

use anyhow::{Context, Result, bail};
use image::{DynamicImage, GenericImageView, RgbImage};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::Instant;
use xcap::Monitor;

use crate::binarize::binarize;
use crate::detect::DetectorParams;
use crate::greyscale::to_greyscale;

const DEBUG_DIR: &str = "screenshots";

/// Screen rectangle to capture, in monitor pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 800,
            height: 200,
        }
    }
}

impl CaptureRegion {
    /// Checks that the region is non-empty and lies within a `screen_w` x `screen_h` screen.
    pub fn validate(&self, screen_w: u32, screen_h: u32) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("Capture region {}x{} is empty", self.width, self.height);
        }
        if self.x >= screen_w
            || self.y >= screen_h
            || self.x.saturating_add(self.width) > screen_w
            || self.y.saturating_add(self.height) > screen_h
        {
            bail!(
                "Capture region ({},{},{},{}) exceeds screenshot dimensions {}x{}",
                self.x,
                self.y,
                self.width,
                self.height,
                screen_w,
                screen_h
            );
        }
        Ok(())
    }
}

/// Captures the primary monitor and crops it to `region`.
/// `label` names the debug dump (e.g. "before", "after").
pub fn capture_region(region: CaptureRegion, label: &str) -> Result<RgbImage> {
    let start = Instant::now();

    let monitors = Monitor::all()
        .context("Failed to enumerate monitors")?;

    let primary_monitor = monitors
        .first()
        .cloned()
        .context("No monitors found")?;

    let screenshot_raw = primary_monitor
        .capture_image()
        .context("Failed to capture image. On macOS, ensure the terminal has Screen Recording permission in System Settings > Privacy & Security > Screen & System Audio Recording")?;

    let screenshot = DynamicImage::ImageRgba8(screenshot_raw);
    if screenshot.dimensions() == (0, 0) {
        bail!("Captured empty screenshot - possible permission issue or no display");
    }

    let (screen_w, screen_h) = screenshot.dimensions();
    region.validate(screen_w, screen_h)?;

    let cropped = screenshot
        .crop_imm(region.x, region.y, region.width, region.height)
        .to_rgb8();

    if debug_enabled() {
        let path = debug_path(&format!("debug_{}", label))?;
        cropped
            .save(&path)
            .with_context(|| format!("Failed to save debug capture to {}", path))?;
    }

    log::debug!("Capture + crop latency ({}): {:?}", label, start.elapsed());

    Ok(cropped)
}

/// True when `DEBUG_CAPTURE` is set.
pub fn debug_enabled() -> bool {
    env::var_os("DEBUG_CAPTURE").is_some()
}

/// Saves the binarized bitmaps of `image` for both polarities to
/// `screenshots/debug_<label>_dark.png` (dark text) and `..._light.png`.
pub fn dump_bitmaps(image: &RgbImage, label: &str, params: &DetectorParams) -> Result<()> {
    let grey = to_greyscale(image);
    for (invert, suffix) in [(false, "dark"), (true, "light")] {
        let binary = binarize(
            &grey,
            params.smoothing_radius,
            params.luminescence_threshold_level(),
            invert,
        );
        let path = debug_path(&format!("debug_{}_{}", label, suffix))?;
        binary
            .to_image()
            .save(&path)
            .with_context(|| format!("Failed to save debug bitmap to {}", path))?;
        log::debug!("{}: {} foreground px", path, binary.foreground_count());
    }
    Ok(())
}

fn debug_path(name: &str) -> Result<String> {
    fs::create_dir_all(DEBUG_DIR)
        .with_context(|| format!("Failed to create {}/ debug directory", DEBUG_DIR))?;
    Ok(format!("{}/{}.png", DEBUG_DIR, name))
}

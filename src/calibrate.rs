//! Calibration module.
//! Interactive setup: capture the editor line, let the user type a few characters,
//! capture again and measure what changed.
//! Uses `dialoguer` for the start prompt and `capture` for the screenshots.
//! Keystrokes are typed by the user; nothing is injected into the editor.

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;
use std::thread;
use std::time::Duration;

use crate::capture::{capture_region, debug_enabled, dump_bitmaps};
use crate::config::CalibrationConfig;
use crate::detect::Detector;
use crate::metrics::Metrics;

/// Runs interactive calibration with the given config.
/// Prompts the user, captures before/after screenshots and returns the detected metrics.
pub fn run_calibration(config: &CalibrationConfig) -> Result<Metrics> {
    println!(
        "Calibration of region ({},{},{}x{}).",
        config.region.x, config.region.y, config.region.width, config.region.height
    );
    println!(
        "Instructions: 1. Put the text cursor at the end of a short line in your editor. \
         2. Confirm here, then switch back to the editor within {} ms. \
         3. When asked, type {} identical characters (e.g. '.') without moving the cursor.",
        config.settle_delay_ms, config.count
    );

    let ready = Confirm::new()
        .with_prompt("Ready?")
        .default(true)
        .interact()
        .context("Failed to read confirmation")?;
    if !ready {
        bail!("Calibration cancelled");
    }

    thread::sleep(Duration::from_millis(config.settle_delay_ms));
    let before = capture_region(config.region, "before")
        .context("Failed to capture screenshot before typing")?;

    println!("Type {} characters now ({} ms)...", config.count, config.typing_delay_ms);
    thread::sleep(Duration::from_millis(config.typing_delay_ms));
    let after = capture_region(config.region, "after")
        .context("Failed to capture screenshot after typing")?;

    let mut detector = Detector::new(config.detector.clone());
    if debug_enabled() {
        dump_bitmaps(&before, "before", detector.params())?;
        dump_bitmaps(&after, "after", detector.params())?;
    }
    let metrics = detector
        .detect(&before, &after, config.count)
        .context("Invalid calibration settings")?
        .with_context(|| {
            format!(
                "No sequence of {} typed characters found; check the region and retry",
                config.count
            )
        })?;

    log::info!("Calibrated: {:?}", metrics);
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "interactive: requires a terminal, a display and screen recording permissions"]
    fn test_calibration_flow() {
        // Nothing is typed, so there is no sequence to find.
        let config = CalibrationConfig::default();
        let err = run_calibration(&config).unwrap_err();
        assert!(err.to_string().contains("No sequence"));
    }
}

//! Config module.
//! Manages I/O for the calibration config (capture region, delays, detector tunables)
//! and the metrics file handed to the latency sampler.
//! Uses serde for JSON serialization.
//! A missing config file yields defaults; a malformed one is an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::capture::CaptureRegion;
use crate::detect::DetectorParams;
use crate::metrics::Metrics;

pub const DEFAULT_CONFIG_PATH: &str = "calibration.json";
pub const DEFAULT_METRICS_PATH: &str = "metrics.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Screen rectangle around the editor line being calibrated.
    pub region: CaptureRegion,
    /// Characters the user types between the two captures.
    pub count: usize,
    /// Time to focus the editor before the first capture.
    pub settle_delay_ms: u64,
    /// Time to type the characters before the second capture.
    pub typing_delay_ms: u64,
    pub detector: DetectorParams,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            region: CaptureRegion::default(),
            count: 5,
            settle_delay_ms: 2000,
            typing_delay_ms: 3000,
            detector: DetectorParams::default(),
        }
    }
}

/// Loads the config at `path`, falling back to defaults if the file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<CalibrationConfig> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(CalibrationConfig::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

pub fn save_config(path: impl AsRef<Path>, config: &CalibrationConfig) -> Result<()> {
    write_json(path.as_ref(), config)
}

pub fn load_metrics(path: impl AsRef<Path>) -> Result<Metrics> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read metrics {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse metrics {}", path.display()))
}

pub fn save_metrics(path: impl AsRef<Path>, metrics: &Metrics) -> Result<()> {
    write_json(path.as_ref(), metrics)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

//! Top-level detection: finds the characters typed between two screenshots
//! and turns them into [`Metrics`].

use std::collections::HashSet;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binarize::binarize;
use crate::color::DEFAULT_TOLERANCE;
use crate::filter::filter_regions;
use crate::greyscale::{RANGE, is_inverted, to_greyscale};
use crate::metrics::{Metrics, metrics_from};
use crate::regions::{Region, WorkQueue, find_regions};
use crate::sequence::find_sequences;

/// Character cells between the anchor and the start of the free-line scan,
/// on top of the typed characters themselves.
const SCAN_MARGIN: usize = 3;

/// Caller errors. Not finding anything is `Ok(None)`, not an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectError {
    #[error("at least 2 typed characters are needed to measure pitch, got {count}")]
    CountTooSmall { count: usize },
    #[error("screenshots differ in size: {before:?} vs {after:?}")]
    DimensionMismatch {
        before: (u32, u32),
        after: (u32, u32),
    },
}

/// Tunables of the detection pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Box radius of the local mean used by binarization.
    pub smoothing_radius: u32,
    /// Contrast against the local mean, as a fraction of the luminance range.
    pub luminescence_threshold: f64,
    /// Minimum share of a bounding box that must be foreground.
    pub fill_threshold: f64,
    pub min_area: u64,
    pub max_area: u64,
    pub max_aspect_ratio: f64,
    /// Minimum distance between left edges of adjacent characters.
    pub min_step: u32,
    pub max_size_deviation: f64,
    pub max_distance_deviation: f64,
    /// Per-channel tolerance when comparing sampled colours.
    pub color_tolerance: u8,
    /// Initial capacity of the flood-fill queue.
    pub queue_capacity: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            smoothing_radius: 2,
            luminescence_threshold: 0.157,
            fill_threshold: 0.7,
            min_area: 1,
            max_area: 100,
            max_aspect_ratio: 2.0,
            min_step: 4,
            max_size_deviation: 2.0,
            max_distance_deviation: 2.0,
            color_tolerance: DEFAULT_TOLERANCE,
            queue_capacity: 256,
        }
    }
}

impl DetectorParams {
    /// Luminance threshold in greyscale units.
    pub fn luminescence_threshold_level(&self) -> u32 {
        (self.luminescence_threshold * f64::from(RANGE)).round() as u32
    }
}

/// Detection pipeline with its reusable flood-fill queue.
///
/// Takes `&mut self`, so one detector serves one detection at a time; use a
/// detector per thread for parallel calibration.
#[derive(Debug)]
pub struct Detector {
    params: DetectorParams,
    queue: WorkQueue,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DetectorParams::default())
    }
}

impl Detector {
    pub fn new(params: DetectorParams) -> Self {
        let queue = WorkQueue::with_capacity(params.queue_capacity);
        Self { params, queue }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Finds the `count` characters typed between `before` and `after` and
    /// measures them in `after`.
    pub fn detect(
        &mut self,
        before: &RgbImage,
        after: &RgbImage,
        count: usize,
    ) -> Result<Option<Metrics>, DetectError> {
        if count < 2 {
            return Err(DetectError::CountTooSmall { count });
        }
        if before.dimensions() != after.dimensions() {
            return Err(DetectError::DimensionMismatch {
                before: before.dimensions(),
                after: after.dimensions(),
            });
        }
        let (width, height) = before.dimensions();
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let inverted = is_inverted(before);
        let grey_before = to_greyscale(before);
        let grey_after = to_greyscale(after);
        log::debug!("{}x{} screenshots, inverted guess: {}", width, height, inverted);

        let found = self
            .new_sequence_in(&grey_before, &grey_after, inverted, count)
            .or_else(|| self.new_sequence_in(&grey_before, &grey_after, !inverted, count));

        Ok(found.and_then(|sequence| {
            metrics_from(&sequence, after, count + SCAN_MARGIN, self.params.color_tolerance)
        }))
    }

    /// Filtered glyph candidates of one greyscale image under one polarity.
    pub fn areas_in(&mut self, grey: &GrayImage, invert: bool) -> HashSet<Region> {
        let p = &self.params;
        let binary = binarize(grey, p.smoothing_radius, p.luminescence_threshold_level(), invert);
        let regions = find_regions(&binary, p.fill_threshold, &mut self.queue);
        filter_regions(regions, p.min_area, p.max_area, p.max_aspect_ratio)
            .into_iter()
            .collect()
    }

    /// All candidate sequences of `length` among `regions`.
    pub fn sequences_in(&self, regions: &[Region], length: usize) -> Vec<Vec<Region>> {
        let p = &self.params;
        find_sequences(
            regions,
            length,
            p.min_step,
            p.max_size_deviation,
            p.max_distance_deviation,
        )
    }

    /// Bottom-most sequence of `count` regions that appear in `after` but not
    /// in `before`, under the given polarity.
    fn new_sequence_in(
        &mut self,
        before: &GrayImage,
        after: &GrayImage,
        invert: bool,
        count: usize,
    ) -> Option<Vec<Region>> {
        let areas_before = self.areas_in(before, invert);
        let areas_after = self.areas_in(after, invert);

        let mut new_areas: Vec<Region> = areas_after.difference(&areas_before).copied().collect();
        new_areas.sort_by_key(|r| (r.y, r.x));

        let mut sequences = self.sequences_in(&new_areas, count);
        sequences.sort_by_key(|s| s[0].y);

        log::debug!(
            "invert={}: {} / {} areas, {} new, {} sequences (queue capacity {})",
            invert,
            areas_before.len(),
            areas_after.len(),
            new_areas.len(),
            sequences.len(),
            self.queue.capacity()
        );

        sequences.pop()
    }
}

/// Runs detection with default parameters and a fresh queue.
pub fn detect(
    before: &RgbImage,
    after: &RgbImage,
    count: usize,
) -> Result<Option<Metrics>, DetectError> {
    Detector::default().detect(before, after, count)
}

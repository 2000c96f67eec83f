//! Calibrates the pixel geometry of a monospaced text line from a pair of
//! screenshots taken before and after typing a few characters.
//!
//! Pipeline: greyscale -> adaptive binarization -> flood-fill regions ->
//! size/shape filter -> set difference between the two screenshots ->
//! evenly spaced sequence search -> metrics.

pub mod binarize;
pub mod calibrate;
pub mod capture;
pub mod color;
pub mod config;
pub mod detect;
pub mod filter;
pub mod greyscale;
pub mod metrics;
pub mod regions;
pub mod sequence;

pub use color::{DEFAULT_TOLERANCE, colors_equal};
pub use detect::{DetectError, Detector, DetectorParams, detect};
pub use metrics::{Metrics, Point};
pub use regions::{Region, WorkQueue};

//! Recognition of evenly spaced, equally sized runs of regions.
//!
//! Regions are grouped into text lines by vertical overlap, ordered left to
//! right, and every window of `length` consecutive regions in a line is
//! checked for monospaced regularity.

use crate::regions::Region;

/// Returns every window of `length` consecutive same-line regions whose steps
/// are at least `min_step`, whose sizes stay within `max_size_deviation` of
/// the first region, and whose steps stay within `max_distance_deviation` of
/// the first step. Sequences come out line by line, each left to right.
pub fn find_sequences(
    regions: &[Region],
    length: usize,
    min_step: u32,
    max_size_deviation: f64,
    max_distance_deviation: f64,
) -> Vec<Vec<Region>> {
    if length == 0 {
        return Vec::new();
    }

    let mut sequences = Vec::new();
    for line in lines_of(regions) {
        if line.len() < length {
            continue;
        }
        for window in line.windows(length) {
            if is_regular(window, min_step, max_size_deviation, max_distance_deviation) {
                sequences.push(window.to_vec());
            }
        }
    }
    sequences
}

/// Groups regions into lines: a region joins the first line whose vertical
/// band it overlaps, widening that band. Lines are sorted by `x`.
///
/// Regions are visited in `y` order, so a new line only starts at or below the
/// bottom of every earlier band and later regions can never reach back into
/// them. Bands stay disjoint without a merge pass.
fn lines_of(regions: &[Region]) -> Vec<Vec<Region>> {
    let mut sorted = regions.to_vec();
    sorted.sort_by_key(|r| (r.y, r.x));

    // (top, bottom, members); bottom is exclusive.
    let mut lines: Vec<(u32, u32, Vec<Region>)> = Vec::new();
    for region in sorted {
        match lines
            .iter_mut()
            .find(|(top, bottom, _)| region.y < *bottom && region.bottom() > *top)
        {
            Some((top, bottom, members)) => {
                *top = (*top).min(region.y);
                *bottom = (*bottom).max(region.bottom());
                members.push(region);
            }
            None => lines.push((region.y, region.bottom(), vec![region])),
        }
    }

    lines
        .into_iter()
        .map(|(_, _, mut members)| {
            members.sort_by_key(|r| (r.x, r.y));
            members
        })
        .collect()
}

fn is_regular(
    window: &[Region],
    min_step: u32,
    max_size_deviation: f64,
    max_distance_deviation: f64,
) -> bool {
    let reference = window[0];
    let same_size = window.iter().all(|r| {
        within(r.width, reference.width, max_size_deviation)
            && within(r.height, reference.height, max_size_deviation)
    });
    if !same_size {
        return false;
    }

    let steps: Vec<u32> = window.windows(2).map(|pair| pair[1].x - pair[0].x).collect();
    let Some(&first_step) = steps.first() else {
        return true;
    };
    steps
        .iter()
        .all(|&step| step >= min_step && within(step, first_step, max_distance_deviation))
}

/// True if `value` and `reference` are within a factor `deviation` of each other.
fn within(value: u32, reference: u32, deviation: f64) -> bool {
    let value = f64::from(value);
    let reference = f64::from(reference);
    value <= reference * deviation && reference <= value * deviation
}

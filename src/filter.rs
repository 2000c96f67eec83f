//! Size and shape filter for glyph candidates.

use crate::regions::Region;

/// Keeps regions with `min_area <= w*h <= max_area` and an aspect ratio of at
/// most `max_aspect_ratio`. Input order is preserved.
pub fn filter_regions<I>(
    regions: I,
    min_area: u64,
    max_area: u64,
    max_aspect_ratio: f64,
) -> Vec<Region>
where
    I: IntoIterator<Item = Region>,
{
    regions
        .into_iter()
        .filter(|r| {
            let area = r.area();
            area >= min_area && area <= max_area && r.aspect_ratio() <= max_aspect_ratio
        })
        .collect()
}

//! Connected foreground regions of a binary image.
//!
//! A [`Region`] is nothing but its bounding rectangle: two components with the
//! same bounds are the same region. Detection relies on this to diff the
//! regions of two screenshots as plain sets.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::binarize::BinaryImage;

/// Axis-aligned bounding rectangle of a connected foreground component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// `max(w/h, h/w)`; always `>= 1` for non-degenerate regions.
    pub fn aspect_ratio(&self) -> f64 {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        (w / h).max(h / w)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Sub-pixel horizontal centre. The extra `-1` is an empirically tuned
    /// bias of the region geometry; keep it.
    pub fn center_x(&self) -> f64 {
        f64::from(self.x) + 0.5 * f64::from(self.width) - 1.0
    }

    /// Sub-pixel vertical centre, with the same bias as [`Region::center_x`].
    pub fn center_y(&self) -> f64 {
        f64::from(self.y) + 0.5 * f64::from(self.height) - 1.0
    }
}

/// Reusable FIFO of pixel indices for flood fill.
///
/// Owned by whoever drives detection and handed to every [`find_regions`]
/// call, so repeated fills reuse one allocation. Not shareable between
/// concurrent detections.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<usize>,
}

impl WorkQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, idx: usize) {
        self.items.push_back(idx);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<usize> {
        self.items.pop_front()
    }

    /// Drops queued items but keeps the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }
}

/// Flood-fills 4-connected foreground components of `binary` and returns the
/// bounding rectangles of those that cover at least `fill_threshold` of the
/// rectangle. Background holes fully enclosed by a component count as part
/// of it, so solid glyphs hollowed out by adaptive thresholding still pass.
pub fn find_regions(
    binary: &BinaryImage,
    fill_threshold: f64,
    queue: &mut WorkQueue,
) -> HashSet<Region> {
    let mut regions = HashSet::new();
    if binary.is_empty() {
        return regions;
    }

    let width = binary.width() as usize;
    let height = binary.height() as usize;
    let bits = binary.as_slice();
    // 0 = not yet labelled.
    let mut labels = vec![0u32; bits.len()];
    let mut label = 0u32;

    for start in 0..bits.len() {
        if !bits[start] || labels[start] != 0 {
            continue;
        }

        label += 1;
        queue.clear();
        queue.push(start);
        labels[start] = label;

        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        let mut filled = 0u64;

        while let Some(idx) = queue.pop() {
            let x = idx % width;
            let y = idx / width;
            filled += 1;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            let mut visit = |n: usize| {
                if bits[n] && labels[n] == 0 {
                    labels[n] = label;
                    queue.push(n);
                }
            };
            if x > 0 {
                visit(idx - 1);
            }
            if x + 1 < width {
                visit(idx + 1);
            }
            if y > 0 {
                visit(idx - width);
            }
            if y + 1 < height {
                visit(idx + width);
            }
        }

        let region = Region::new(
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        );
        let area = region.area();
        let mut fill = filled as f64 / area as f64;
        if fill < fill_threshold {
            let outside = outside_count(&labels, width, region, label, queue);
            fill = (area - outside) as f64 / area as f64;
        }

        if fill >= fill_threshold {
            regions.insert(region);
        } else {
            log::trace!("dropping sparse region {:?} (fill {:.2})", region, fill);
        }
    }

    queue.clear();
    regions
}

/// Counts pixels of `region` that are not in component `label` and are
/// 4-connected to the rectangle's border through other such pixels. The rest
/// of the rectangle is the component plus the holes it encloses.
fn outside_count(
    labels: &[u32],
    width: usize,
    region: Region,
    label: u32,
    queue: &mut WorkQueue,
) -> u64 {
    let (x0, y0) = (region.x as usize, region.y as usize);
    let (w, h) = (region.width as usize, region.height as usize);
    let open = |local: usize| labels[(y0 + local / w) * width + x0 + local % w] != label;

    let mut seen = vec![false; w * h];
    queue.clear();
    for local in 0..w * h {
        let (lx, ly) = (local % w, local / w);
        let on_border = lx == 0 || ly == 0 || lx + 1 == w || ly + 1 == h;
        if on_border && open(local) {
            seen[local] = true;
            queue.push(local);
        }
    }

    let mut outside = 0u64;
    while let Some(local) = queue.pop() {
        outside += 1;
        let (lx, ly) = (local % w, local / w);
        let neighbours = [
            (lx > 0, local.wrapping_sub(1)),
            (lx + 1 < w, local + 1),
            (ly > 0, local.wrapping_sub(w)),
            (ly + 1 < h, local + w),
        ];
        for (inside, n) in neighbours {
            if inside && !seen[n] && open(n) {
                seen[n] = true;
                queue.push(n);
            }
        }
    }
    outside
}

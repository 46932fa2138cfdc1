use std::collections::HashMap;

use image::Luma;
use imageproc::region_labelling::{connected_components, Connectivity};

use super::mask::Mask;

/// One connected blob of set pixels, as flat `y * width + x` indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub pixels: Vec<usize>,
}

impl Region {
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// The blob alone, cropped to its bounding box plus a one pixel margin
    /// (clamped to the image). Returns the mask and its top-left corner.
    pub fn to_cropped_mask(&self, width: u32, height: u32) -> (Mask, u32, u32) {
        let w = width as usize;
        if self.pixels.is_empty() || w == 0 {
            return (Mask::new(0, 0), 0, 0);
        }

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (usize::MAX, usize::MAX, 0, 0);
        for &i in &self.pixels {
            let (x, y) = (i % w, i / w);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let x0 = min_x.saturating_sub(1);
        let y0 = min_y.saturating_sub(1);
        let x1 = (max_x + 2).min(w);
        let y1 = (max_y + 2).min(height as usize);

        let mut mask = Mask::new((x1 - x0) as u32, (y1 - y0) as u32);
        for &i in &self.pixels {
            mask.set((i % w - x0) as u32, (i / w - y0) as u32, true);
        }
        (mask, x0 as u32, y0 as u32)
    }
}

/// Find every 4-connected region of at least `min_area` pixels.
///
/// Each blob is its own region, even when several share a color. Regions are
/// returned in the order a row-major scan first reaches them.
pub fn find_regions(mask: &Mask, min_area: usize) -> Vec<Region> {
    let labeled = connected_components(&mask.to_image(), Connectivity::Four, Luma([0u8]));
    let width = mask.width() as usize;

    // Labels come in scan order, so the first pixel of each group is its seed
    let mut groups: HashMap<u32, Vec<usize>> = HashMap::new();
    for (x, y, label) in labeled.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue; // Background
        }
        groups
            .entry(label)
            .or_default()
            .push(y as usize * width + x as usize);
    }

    let mut regions: Vec<Region> = groups
        .into_values()
        .filter(|pixels| pixels.len() >= min_area)
        .map(|pixels| Region { pixels })
        .collect();

    regions.sort_by_key(|r| r.pixels[0]);
    regions
}

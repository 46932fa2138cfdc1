use image::{GrayImage, Luma, RgbaImage};

use crate::models::Color;

/// Binary mask, one byte per pixel in row-major order (`y * width + x`).
/// 1 means the pixel belongs to the color or region of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self { width, height, data })
    }

    /// Mark every opaque pixel within `tolerance` (RGB distance) of `target`
    pub fn from_color(image: &RgbaImage, target: Color, tolerance: f64) -> Self {
        let (width, height) = image.dimensions();
        let data = image
            .as_raw()
            .chunks_exact(4)
            .map(|px| {
                if px[3] < 128 {
                    return 0;
                }
                let dist = target.distance(&Color::new(px[0], px[1], px[2]));
                (dist <= tolerance) as u8
            })
            .collect();
        Self { width, height, data }
    }

    /// Rasterize a list of flat pixel indices
    pub fn from_indices(width: u32, height: u32, indices: &[usize]) -> Self {
        let mut mask = Self::new(width, height);
        for &idx in indices {
            if let Some(px) = mask.data.get_mut(idx) {
                *px = 1;
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Out-of-bounds coordinates read as unset
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.data[self.index(x as u32, y as u32)] != 0
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = self.index(x, y);
        self.data[idx] = value as u8;
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// A set pixel on the image edge or next to an unset 4-neighbor
    pub fn is_boundary(&self, x: u32, y: u32) -> bool {
        if !self.get(x as i64, y as i64) {
            return false;
        }
        if x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1 {
            return true;
        }
        let (x, y) = (x as i64, y as i64);
        !self.get(x - 1, y) || !self.get(x + 1, y) || !self.get(x, y - 1) || !self.get(x, y + 1)
    }

    /// White on black, for debug output and imageproc interop
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.data[self.index(x, y)] != 0 { 255 } else { 0 }])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_color_mask_tolerance_and_alpha() {
        let mut img = RgbaImage::from_pixel(3, 1, Rgba([200, 60, 60, 255]));
        img.put_pixel(1, 0, Rgba([200, 60, 60, 10]));
        img.put_pixel(2, 0, Rgba([240, 60, 60, 255]));

        let mask = Mask::from_color(&img, Color::new(200, 60, 60), 40.0);
        assert_eq!(mask.as_slice(), &[1, 0, 1]);

        let strict = Mask::from_color(&img, Color::new(200, 60, 60), 39.0);
        assert_eq!(strict.as_slice(), &[1, 0, 0]);
    }

    #[test]
    fn test_boundary_pixels() {
        let mask = Mask::from_indices(5, 5, &(0..25).collect::<Vec<_>>());
        assert!(mask.is_boundary(0, 2));
        assert!(!mask.is_boundary(2, 2));

        let mut holed = mask.clone();
        holed.set(2, 1, false);
        assert!(holed.is_boundary(2, 2));
        assert!(!holed.is_boundary(2, 1));
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(Mask::from_raw(2, 2, vec![0; 3]).is_none());
        assert_eq!(Mask::from_raw(2, 2, vec![1, 0, 0, 1]).unwrap().count(), 2);
    }
}

//! Intermediate images for checking a detection run by eye.

use std::path::Path;

use anyhow::Result;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;

use crate::models::{Color, ColorCluster, DetectedPolygon, Point};

const FILL_ALPHA: f32 = 0.2;
const CENTROID_RADIUS: i32 = 5;
const CENTROID_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Images collected while detecting, in pipeline order
#[derive(Debug, Clone)]
pub struct DebugVisualization {
    pub original: RgbaImage,
    /// Every pixel painted with its matching apartment color, the rest grayed out
    pub color_clusters: RgbaImage,
    /// Raw color masks, one per dominant color
    pub masks: Vec<(Color, GrayImage)>,
    /// Masks after morphological cleanup
    pub cleaned_masks: Vec<(Color, GrayImage)>,
    /// Original with every detected polygon drawn on top
    pub contours: RgbaImage,
}

impl DebugVisualization {
    pub fn new(
        original: &RgbaImage,
        colors: &[ColorCluster],
        tolerance: f64,
        masks: Vec<(Color, GrayImage)>,
        cleaned_masks: Vec<(Color, GrayImage)>,
        polygons: &[DetectedPolygon],
    ) -> Self {
        Self {
            original: original.clone(),
            color_clusters: render_color_clusters(original, colors, tolerance),
            masks,
            cleaned_masks,
            contours: render_contours(original, polygons),
        }
    }

    /// Write every image under `dir`
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        self.original.save(dir.join("00_original.png"))?;
        self.color_clusters.save(dir.join("01_color_clusters.png"))?;
        save_masks(&dir.join("02_masks"), &self.masks)?;
        save_masks(&dir.join("03_cleaned_masks"), &self.cleaned_masks)?;
        self.contours.save(dir.join("04_contours.png"))?;
        log::debug!("Saved debug visualization to {}", dir.display());
        Ok(())
    }
}

fn save_masks(dir: &Path, masks: &[(Color, GrayImage)]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for (i, (color, mask)) in masks.iter().enumerate() {
        let name = format!("{:02}_{}_{}_{}.png", i + 1, color.r, color.g, color.b);
        mask.save(dir.join(name))?;
    }
    Ok(())
}

/// Paint each opaque pixel with the nearest cluster color within `tolerance`;
/// anything else becomes translucent gray.
pub fn render_color_clusters(image: &RgbaImage, colors: &[ColorCluster], tolerance: f64) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        if a < 128 {
            return Rgba([0, 0, 0, 0]);
        }

        let pixel = Color::new(r, g, b);
        let closest = colors
            .iter()
            .map(|c| (c.color, pixel.distance(&c.color)))
            .filter(|&(_, dist)| dist <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match closest {
            Some((c, _)) => Rgba([c.r, c.g, c.b, 255]),
            None => {
                let gray = ((r as u16 + g as u16 + b as u16) / 3) as u8;
                Rgba([gray, gray, gray, 100])
            }
        }
    })
}

/// Overlay every polygon on the image: outline and 20% fill in its own hue,
/// red dot at the centroid.
pub fn render_contours(image: &RgbaImage, polygons: &[DetectedPolygon]) -> RgbaImage {
    let mut canvas = image.clone();

    for (index, polygon) in polygons.iter().enumerate() {
        let hue = index as f64 * 360.0 / polygons.len() as f64;
        let [r, g, b] = hsl_to_rgb(hue, 1.0, 0.5);

        fill_translucent(&mut canvas, &polygon.points, [r, g, b]);
        draw_outline(&mut canvas, &polygon.points, Rgba([r, g, b, 255]), 1);

        let (cx, cy) = (polygon.centroid.x.round() as i32, polygon.centroid.y.round() as i32);
        draw_filled_circle_mut(&mut canvas, (cx, cy), CENTROID_RADIUS, CENTROID_COLOR);
    }

    canvas
}

/// Closed polyline; `spread` thickens it by that many pixels each way
fn draw_outline(canvas: &mut RgbaImage, points: &[Point], color: Rgba<u8>, spread: i32) {
    if points.len() < 2 {
        return;
    }

    for dy in -spread..=spread {
        for dx in -spread..=spread {
            for (i, start) in points.iter().enumerate() {
                let end = &points[(i + 1) % points.len()];
                draw_line_segment_mut(
                    canvas,
                    ((start.x + dx as f64) as f32, (start.y + dy as f64) as f32),
                    ((end.x + dx as f64) as f32, (end.y + dy as f64) as f32),
                    color,
                );
            }
        }
    }
}

fn fill_translucent(canvas: &mut RgbaImage, points: &[Point], rgb: [u8; 3]) {
    let mut poly: Vec<PixelPoint<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let q = PixelPoint::new(p.x.round() as i32, p.y.round() as i32);
        if poly.last() != Some(&q) {
            poly.push(q);
        }
    }
    // The filler rejects explicitly closed rings
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return;
    }

    let mut coverage = GrayImage::new(canvas.width(), canvas.height());
    draw_polygon_mut(&mut coverage, &poly, Luma([255u8]));

    for (x, y, covered) in coverage.enumerate_pixels() {
        if covered[0] == 0 {
            continue;
        }
        let pixel = canvas.get_pixel_mut(x, y);
        for c in 0..3 {
            let blended = pixel[c] as f32 * (1.0 - FILL_ALPHA) + rgb[c] as f32 * FILL_ALPHA;
            pixel[c] = blended.round() as u8;
        }
        pixel[3] = pixel[3].max((255.0 * FILL_ALPHA) as u8);
    }
}

/// `hue` in degrees, `saturation` and `lightness` in 0..=1
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> [u8; 3] {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{bounding_box, centroid, polygon_area, rectangle};

    fn square_polygon(x: f64, y: f64, size: f64) -> DetectedPolygon {
        let points = rectangle(x, y, size, size);
        DetectedPolygon {
            bounding_box: bounding_box(&points),
            area: polygon_area(&points),
            centroid: centroid(&points),
            color: None,
            points,
        }
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), [0, 0, 255]);
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), [255, 0, 0]);
    }

    #[test]
    fn test_color_cluster_view() {
        let mut image = RgbaImage::from_pixel(3, 1, Rgba([100, 150, 200, 255]));
        image.put_pixel(1, 0, Rgba([30, 60, 90, 255]));
        image.put_pixel(2, 0, Rgba([100, 150, 200, 0]));
        let clusters = [ColorCluster { color: Color::new(102, 148, 200), count: 10 }];

        let view = render_color_clusters(&image, &clusters, 40.0);
        assert_eq!(*view.get_pixel(0, 0), Rgba([102, 148, 200, 255]));
        assert_eq!(*view.get_pixel(1, 0), Rgba([60, 60, 60, 100]));
        assert_eq!(view.get_pixel(2, 0)[3], 0);
    }

    #[test]
    fn test_contour_overlay_marks_centroid_and_tints_inside() {
        let image = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let polygon = square_polygon(20.0, 20.0, 60.0);

        let overlay = render_contours(&image, &[polygon]);
        assert_eq!(*overlay.get_pixel(50, 50), CENTROID_COLOR);
        // Single polygon gets hue 0: red tint inside
        let inside = overlay.get_pixel(30, 65);
        assert_eq!(inside[0], 255);
        assert!(inside[1] < 255 && inside[1] > 150);
        assert_eq!(*overlay.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_save_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let image = RgbaImage::from_pixel(20, 20, Rgba([10, 200, 10, 255]));
        let mask = GrayImage::from_pixel(20, 20, Luma([255]));
        let color = Color::new(10, 200, 10);

        let vis = DebugVisualization::new(
            &image,
            &[ColorCluster { color, count: 4 }],
            40.0,
            vec![(color, mask.clone())],
            vec![(color, mask)],
            &[square_polygon(2.0, 2.0, 10.0)],
        );
        vis.save(dir.path()).unwrap();

        for file in [
            "00_original.png",
            "01_color_clusters.png",
            "02_masks/01_10_200_10.png",
            "03_cleaned_masks/01_10_200_10.png",
            "04_contours.png",
        ] {
            assert!(dir.path().join(file).exists(), "missing {}", file);
        }
    }
}

//! Parameter suggestions and side-by-side comparison of option sets.

use image::{DynamicImage, RgbaImage};
use serde::Serialize;

use super::options::{DetectionOptions, Preset};
use super::{colors, ApartmentDetector};
use crate::error::Result;
use crate::models::DetectedPolygon;

/// Outcome of running one named option set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterComparison {
    pub name: String,
    pub polygon_count: usize,
    /// Mean polygon area, rounded to whole pixels
    pub average_area: f64,
    pub polygons: Vec<DetectedPolygon>,
}

/// Estimate options for `image` from its size and how many fill colors it has
pub fn suggest_parameters(image: &RgbaImage) -> DetectionOptions {
    let (width, height) = image.dimensions();
    let image_size = width as u64 * height as u64;
    let shorter_side = width.min(height);

    let color_count = colors::find_apartment_colors(image).len();
    let estimated_apartments = ((color_count as f64 / 1.5).floor() as u64).clamp(8, 15);

    let min_area_by_count = image_size / estimated_apartments / 2;
    let min_area_by_size = (image_size / 300).max(500);
    let min_area = min_area_by_count.min(min_area_by_size).max(500);

    let color_tolerance = if color_count > 15 {
        50.0
    } else if color_count > 10 {
        40.0
    } else {
        30.0
    };

    log::debug!(
        "Suggesting parameters for {}x{} with {} colors (~{} apartments)",
        width,
        height,
        color_count,
        estimated_apartments
    );

    DetectionOptions {
        min_area: Some(min_area.min(u32::MAX as u64) as u32),
        max_area: Some((image_size / 2) as f64),
        color_tolerance,
        simplify_tolerance: (shorter_side / 150).clamp(6, 12) as f64,
        morph_radius: (shorter_side / 400).clamp(3, 7),
        corner_angle_threshold: 15.0,
        ..DetectionOptions::default()
    }
}

/// Run detection once per option set
pub fn compare_parameters(
    image: &RgbaImage,
    parameter_sets: &[(String, DetectionOptions)],
) -> Result<Vec<ParameterComparison>> {
    let image = DynamicImage::ImageRgba8(image.clone());
    let mut results = Vec::with_capacity(parameter_sets.len());

    for (name, options) in parameter_sets {
        let polygons = ApartmentDetector::new(options.clone()).detect(&image)?.polygons;
        let average_area = if polygons.is_empty() {
            0.0
        } else {
            polygons.iter().map(|p| p.area).sum::<f64>() / polygons.len() as f64
        };

        log::debug!("{}: {} polygons, average area {:.0}", name, polygons.len(), average_area);
        results.push(ParameterComparison {
            name: name.clone(),
            polygon_count: polygons.len(),
            average_area: average_area.round(),
            polygons,
        });
    }

    Ok(results)
}

/// Every preset, by name, ready for [`compare_parameters`]
pub fn preset_parameter_sets() -> Vec<(String, DetectionOptions)> {
    Preset::ALL
        .iter()
        .map(|preset| (preset.name().to_string(), preset.options()))
        .collect()
}

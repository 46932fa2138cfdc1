use serde::{Deserialize, Serialize};

/// Tuning knobs for apartment detection. Unset fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionOptions {
    /// Smallest accepted apartment, in pixels. `None` adapts to the image:
    /// `max(500, pixels / 200)`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_area: Option<u32>,
    /// Largest accepted apartment, in pixels. `None` means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_area: Option<f64>,
    /// RGB distance for color matching and dominant-color separation
    pub color_tolerance: f64,
    pub simplify_tolerance: f64,
    /// Morphological cleanup radius, in pixels
    pub morph_radius: u32,
    /// Minimum turn angle (degrees) for a vertex to count as a corner
    pub corner_angle_threshold: f64,
    /// How many fill colors to treat as apartments
    pub dominant_colors: usize,
    /// Collect intermediate images for visual inspection
    pub debug: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            min_area: None,
            max_area: None,
            color_tolerance: 40.0,
            simplify_tolerance: 8.0,
            morph_radius: 5,
            corner_angle_threshold: 15.0,
            dominant_colors: 2,
            debug: false,
        }
    }
}

impl DetectionOptions {
    /// `max(500, total_pixels / 200)`, i.e. at least 0.5 % of the image
    pub fn adaptive_min_area(total_pixels: u64) -> u32 {
        (total_pixels / 200).max(500).min(u32::MAX as u64) as u32
    }

    pub fn resolved_min_area(&self, width: u32, height: u32) -> u32 {
        self.min_area
            .unwrap_or_else(|| Self::adaptive_min_area(width as u64 * height as u64))
    }

    pub fn resolved_max_area(&self) -> f64 {
        self.max_area.unwrap_or(f64::INFINITY)
    }

    pub fn with_min_area(mut self, min_area: u32) -> Self {
        self.min_area = Some(min_area);
        self
    }

    pub fn with_max_area(mut self, max_area: f64) -> Self {
        self.max_area = Some(max_area);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Parameter sets for common kinds of floor plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Detects small apartments, more detailed polygons
    HighPrecision,
    /// Good for most floor plans with clean straight edges
    Balanced,
    /// Filters noise, merges details, very few vertices
    Robust,
    /// Floor plans with large apartments
    LargeBuildings,
    /// Complex floor plans with 10+ apartments
    ManyApartments,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::HighPrecision,
        Preset::Balanced,
        Preset::Robust,
        Preset::LargeBuildings,
        Preset::ManyApartments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::HighPrecision => "high_precision",
            Preset::Balanced => "balanced",
            Preset::Robust => "robust",
            Preset::LargeBuildings => "large_buildings",
            Preset::ManyApartments => "many_apartments",
        }
    }

    pub fn options(&self) -> DetectionOptions {
        let (min_area, color_tolerance, simplify_tolerance, morph_radius, corner_angle_threshold) =
            match self {
                Preset::HighPrecision => (500, 25.0, 5.0, 3, 10.0),
                Preset::Balanced => (1500, 40.0, 8.0, 5, 15.0),
                Preset::Robust => (5000, 50.0, 12.0, 7, 20.0),
                Preset::LargeBuildings => (10000, 45.0, 15.0, 8, 20.0),
                Preset::ManyApartments => (800, 35.0, 7.0, 4, 12.0),
            };

        DetectionOptions {
            min_area: Some(min_area),
            color_tolerance,
            simplify_tolerance,
            morph_radius,
            corner_angle_threshold,
            ..DetectionOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_min_area() {
        assert_eq!(DetectionOptions::adaptive_min_area(40_000), 500);
        assert_eq!(DetectionOptions::adaptive_min_area(1_000_000), 5000);

        let options = DetectionOptions::default();
        assert_eq!(options.resolved_min_area(1000, 1000), 5000);
        assert_eq!(options.clone().with_min_area(42).resolved_min_area(1000, 1000), 42);
        assert!(options.resolved_max_area().is_infinite());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: DetectionOptions =
            serde_json::from_str(r#"{"minArea": 800, "colorTolerance": 25}"#).unwrap();
        assert_eq!(options.min_area, Some(800));
        assert_eq!(options.color_tolerance, 25.0);
        assert_eq!(options.morph_radius, 5);
        assert_eq!(options.dominant_colors, 2);
    }

    #[test]
    fn test_presets() {
        let balanced = Preset::Balanced.options();
        assert_eq!(balanced.min_area, Some(1500));
        assert_eq!(balanced.simplify_tolerance, 8.0);
        assert_eq!(Preset::Robust.options().morph_radius, 7);
        assert_eq!(Preset::ALL.len(), 5);
    }
}

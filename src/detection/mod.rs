pub mod colors;
pub mod mask;
pub mod morphology;
pub mod regions;
pub mod contours;
pub mod simplify;
pub mod options;
pub mod steps;
pub mod debug;
pub mod tuning;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GrayImage, RgbaImage};

use crate::error::{DetectionError, Result};
use crate::geometry::{bounding_box, centroid};
use crate::models::{Color, ColorCluster, DetectedPolygon};
use crate::pipeline::{Capture, Payload, Pipeline, PipelineData};

use debug::DebugVisualization;
use options::DetectionOptions;
use steps::{CONTOUR_AREA, COLOR_MASK_STEP, MASK_CLEANUP_STEP};

/// Centroids closer than this vertically belong to the same row
pub const ROW_BAND: f64 = 50.0;

/// Progress callback: stage name and percentage (0-100)
pub type ProgressFn = Arc<dyn Fn(&str, f32) + Send + Sync>;

/// Result of one detection call
#[derive(Debug, Clone)]
pub struct Detection {
    /// Apartment candidates in reading order
    pub polygons: Vec<DetectedPolygon>,
    /// Intermediate images, present when debugging was requested
    pub debug: Option<DebugVisualization>,
}

/// Finds apartment outlines in color-coded floor plans
#[derive(Clone, Default)]
pub struct ApartmentDetector {
    options: DetectionOptions,
    progress: Option<ProgressFn>,
    debug_dir: Option<PathBuf>,
}

impl ApartmentDetector {
    pub fn new(options: DetectionOptions) -> Self {
        Self {
            options,
            progress: None,
            debug_dir: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Write step dumps and the debug visualization into `dir`.
    /// The directory must be empty or non-existent; later `detect` calls
    /// overwrite the files of earlier ones
    pub fn with_debug_dir(mut self, dir: PathBuf) -> Result<Self> {
        crate::pipeline::ensure_empty_dir(&dir).map_err(|e| DetectionError::DebugOutput(e.to_string()))?;
        self.options.debug = true;
        self.debug_dir = Some(dir);
        Ok(self)
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    fn report(&self, stage: &str, percent: f32) {
        if let Some(progress) = &self.progress {
            progress(stage, percent);
        }
    }

    /// The per-color pipeline: mask → cleanup → regions → contour → area check → simplify
    pub fn build_pipeline(&self, min_area: u32) -> Pipeline {
        use steps::*;

        let max_area = self.options.resolved_max_area();
        Pipeline::new()
            .add_step(Arc::new(ColorMaskStep {
                tolerance: self.options.color_tolerance,
            }))
            .add_step(Arc::new(MaskCleanupStep {
                radius: self.options.morph_radius,
            }))
            .add_step(Arc::new(RegionSplitStep { min_area }))
            .add_step(Arc::new(ContourTraceStep))
            .add_step(Arc::new(AreaFilterStep {
                min_area: min_area as f64,
                max_area,
            }))
            .add_step(Arc::new(SimplifyStep {
                tolerance: self.options.simplify_tolerance,
                corner_angle_threshold: self.options.corner_angle_threshold,
                min_area: min_area as f64,
                max_area,
            }))
    }

    /// Detect apartments in an already decoded image
    pub fn detect(&self, image: &DynamicImage) -> Result<Detection> {
        self.report("Loading image", 0.0);
        self.detect_rgba(&image.to_rgba8())
    }

    /// Read and decode `path`, then detect on a blocking worker thread
    pub async fn detect_file(&self, path: impl AsRef<Path>) -> Result<Detection> {
        let path = path.as_ref().to_path_buf();
        self.report("Loading image", 0.0);

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| DetectionError::ImageRead { path: path.clone(), source })?;

        let detector = self.clone();
        tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&bytes)?;
            log::debug!("Decoded {}: {}x{}", path.display(), image.width(), image.height());
            detector.detect_rgba(&image.to_rgba8())
        })
        .await?
    }

    fn detect_rgba(&self, image: &RgbaImage) -> Result<Detection> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::EmptyImage);
        }

        self.report("Finding apartment colors", 10.0);
        let clusters = colors::find_apartment_colors(image);
        let dominant = colors::select_dominant_colors(
            &clusters,
            self.options.dominant_colors,
            self.options.color_tolerance,
        );
        for cluster in &dominant {
            log::info!("Apartment color {} ({} samples)", cluster.color.css(), cluster.count);
        }

        let min_area = self.options.resolved_min_area(width, height);
        log::debug!("Image {}x{}, min area {} px", width, height, min_area);

        let mut pipeline = self.build_pipeline(min_area);
        if self.options.debug {
            pipeline = pipeline.with_captures();
        }
        if let Some(dir) = &self.debug_dir {
            pipeline = pipeline.with_debug_output(dir.join("steps"));
        }

        let source = Arc::new(image.clone());
        let mut polygons = Vec::new();

        for (i, cluster) in dominant.iter().enumerate() {
            let percent = 10.0 + (i as f32 / dominant.len() as f32) * 80.0;
            self.report("Processing apartments", percent);

            let input = PipelineData::for_color(source.clone(), cluster.color);
            let results = pipeline.run_with_executor(input, i + 1)?;

            let before = polygons.len();
            polygons.extend(results.iter().filter_map(to_detected_polygon));
            log::info!("Color {}: {} apartment polygons", cluster.color.css(), polygons.len() - before);
        }

        self.report("Sorting results", 95.0);
        sort_reading_order(&mut polygons);
        log::info!("Detected {} apartment polygons", polygons.len());

        let debug = if self.options.debug {
            let captures = pipeline
                .context()
                .debug
                .as_ref()
                .map(|d| d.take_captures())
                .unwrap_or_default();
            let visualization = DebugVisualization::new(
                image,
                &dominant,
                self.options.color_tolerance,
                masks_from(&captures, COLOR_MASK_STEP),
                masks_from(&captures, MASK_CLEANUP_STEP),
                &polygons,
            );
            if let Some(dir) = &self.debug_dir {
                visualization.save(dir)?;
            }
            Some(visualization)
        } else {
            None
        };

        self.report("Complete", 100.0);
        Ok(Detection { polygons, debug })
    }
}

fn to_detected_polygon(item: &PipelineData) -> Option<DetectedPolygon> {
    let Payload::Polygon(points) = &item.payload else {
        return None;
    };

    Some(DetectedPolygon {
        bounding_box: bounding_box(points),
        area: item.get_float(CONTOUR_AREA).unwrap_or_default(),
        centroid: centroid(points),
        color: item.color.map(|c| c.css()),
        points: points.clone(),
    })
}

fn masks_from(captures: &[Capture], step: &str) -> Vec<(Color, GrayImage)> {
    captures
        .iter()
        .filter(|c| c.step == step)
        .filter_map(|c| Some((c.color?, c.image.to_luma8())))
        .collect()
}

/// Order polygons top to bottom, then left to right.
///
/// Sorted by centroid Y first; a new row starts whenever a centroid lies more
/// than [`ROW_BAND`] below the first centroid of the current row. Each row is
/// then sorted by centroid X.
pub fn sort_reading_order(polygons: &mut [DetectedPolygon]) {
    polygons.sort_by(|a, b| a.centroid.y.total_cmp(&b.centroid.y));

    let mut start = 0;
    while start < polygons.len() {
        let row_top = polygons[start].centroid.y;
        let end = polygons[start..]
            .iter()
            .position(|p| p.centroid.y - row_top > ROW_BAND)
            .map_or(polygons.len(), |offset| start + offset);

        polygons[start..end].sort_by(|a, b| a.centroid.x.total_cmp(&b.centroid.x));
        start = end;
    }
}

/// Clusters that would be used as apartment colors for `image`
pub fn dominant_colors(image: &RgbaImage, options: &DetectionOptions) -> Vec<ColorCluster> {
    let clusters = colors::find_apartment_colors(image);
    colors::select_dominant_colors(&clusters, options.dominant_colors, options.color_tolerance)
}

/// Detect apartment polygons in the image at `path`
pub async fn detect_apartment_polygons(
    path: impl AsRef<Path>,
    options: DetectionOptions,
) -> Result<Vec<DetectedPolygon>> {
    let detection = ApartmentDetector::new(options).detect_file(path).await?;
    Ok(detection.polygons)
}

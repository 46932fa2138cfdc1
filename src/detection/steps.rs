use crate::pipeline::{MetadataValue, Payload, PipelineContext, PipelineData, PipelineStep};
use crate::detection::{contours, mask::Mask, morphology, regions, simplify};
use crate::geometry::polygon_area;
use crate::models::Point;
use anyhow::Result;

/// Metadata key: pixel count of the region a candidate came from
pub const REGION_PIXELS: &str = "region_pixels";
/// Metadata key: shoelace area of the traced contour
pub const CONTOUR_AREA: &str = "contour_area";

pub const COLOR_MASK_STEP: &str = "Color Mask";
pub const MASK_CLEANUP_STEP: &str = "Mask Cleanup";

/// Isolate the pixels close to the candidate's color
pub struct ColorMaskStep {
    pub tolerance: f64,
}

impl PipelineStep for ColorMaskStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let color = item
                .color
                .ok_or_else(|| anyhow::anyhow!("Color mask step needs a target color"))?;
            let mask = Mask::from_color(&item.source, color, self.tolerance);
            log::debug!("Color {}: {} matching pixels", color.css(), mask.count());
            result.push(item.with_payload(Payload::Mask(mask)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        COLOR_MASK_STEP
    }

    fn captures_output(&self) -> bool {
        true
    }
}

/// Close gaps, then open away specks
pub struct MaskCleanupStep {
    pub radius: u32,
}

impl PipelineStep for MaskCleanupStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let Payload::Mask(mask) = &item.payload else {
                return Err(anyhow::anyhow!("Mask cleanup expects a mask, got {}", item.payload.kind()));
            };
            let cleaned = morphology::cleanup_mask(mask, self.radius);
            result.push(item.with_payload(Payload::Mask(cleaned)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        MASK_CLEANUP_STEP
    }

    fn captures_output(&self) -> bool {
        true
    }
}

/// Split a mask into one item per connected region (1 → many).
/// Each region travels as a mask cropped around it.
pub struct RegionSplitStep {
    pub min_area: u32,
}

impl PipelineStep for RegionSplitStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let Payload::Mask(mask) = &item.payload else {
                return Err(anyhow::anyhow!("Region split expects a mask, got {}", item.payload.kind()));
            };

            let found = regions::find_regions(mask, self.min_area as usize);
            log::info!("Color {}: {} regions of at least {} px", item.color_label(), found.len(), self.min_area);

            for region in found {
                let (cropped, x, y) = region.to_cropped_mask(mask.width(), mask.height());
                result.push(
                    item.with_payload(Payload::Region { mask: cropped, x, y })
                        .with_metadata(REGION_PIXELS, MetadataValue::Int(region.area() as i64)),
                );
            }
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Region Split"
    }
}

/// Trace the outer boundary of each region
pub struct ContourTraceStep;

impl PipelineStep for ContourTraceStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let traced: Option<Vec<Point>> = match &item.payload {
                Payload::Mask(mask) => contours::trace_outer_contour(mask),
                Payload::Region { mask, x, y } => {
                    let (width, height) = item.source.dimensions();
                    let (dx, dy) = (*x as f64, *y as f64);
                    contours::trace_outer_contour_with_limit(mask, width as usize * height as usize).map(
                        |points| points.into_iter().map(|p| Point::new(p.x + dx, p.y + dy)).collect(),
                    )
                }
                other => {
                    return Err(anyhow::anyhow!("Contour tracing expects a mask, got {}", other.kind()));
                }
            };

            match traced {
                Some(contour) => {
                    let area = polygon_area(&contour);
                    result.push(
                        item.with_payload(Payload::Contour(contour))
                            .with_metadata(CONTOUR_AREA, MetadataValue::Float(area)),
                    );
                }
                None => log::debug!(
                    "Color {}: skipping region of {} px, contour too short",
                    item.color_label(),
                    item.get_int(REGION_PIXELS).unwrap_or(0)
                ),
            }
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Contour Trace"
    }
}

/// Drop contours whose area is outside `[min_area, max_area]`
pub struct AreaFilterStep {
    pub min_area: f64,
    pub max_area: f64,
}

impl PipelineStep for AreaFilterStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let area = item.get_float(CONTOUR_AREA).unwrap_or(0.0);
            if area < self.min_area || area > self.max_area {
                log::debug!(
                    "Color {}: skipping contour with area {:.0} outside [{}, {}]",
                    item.color_label(),
                    area,
                    self.min_area,
                    self.max_area
                );
                continue;
            }
            result.push(item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Area Filter"
    }
}

/// Reduce each contour to a clean polygon.
/// Polygons left with fewer than three vertices, or whose own area falls
/// outside `[min_area, max_area]`, are dropped.
pub struct SimplifyStep {
    pub tolerance: f64,
    pub corner_angle_threshold: f64,
    pub min_area: f64,
    pub max_area: f64,
}

impl PipelineStep for SimplifyStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let Payload::Contour(contour) = &item.payload else {
                return Err(anyhow::anyhow!("Simplification expects a contour, got {}", item.payload.kind()));
            };

            let polygon = simplify::simplify_polygon(contour, self.tolerance, self.corner_angle_threshold);
            if polygon.len() < 3 {
                log::debug!(
                    "Color {}: skipping contour, only {} vertices after simplification",
                    item.color_label(),
                    polygon.len()
                );
                continue;
            }

            let area = polygon_area(&polygon);
            if area < self.min_area || area > self.max_area {
                log::debug!(
                    "Color {}: skipping polygon with simplified area {:.1} outside [{}, {}]",
                    item.color_label(),
                    area,
                    self.min_area,
                    self.max_area
                );
                continue;
            }

            log::debug!(
                "Color {}: {} contour points → {} vertices",
                item.color_label(),
                contour.len(),
                polygon.len()
            );
            result.push(item.with_payload(Payload::Polygon(polygon)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Simplify"
    }
}

use floorplan_zones::detection::dominant_colors;
use floorplan_zones::detection::steps::*;
use floorplan_zones::{DetectionOptions, Payload, Pipeline, PipelineData};
use image::ImageReader;
use std::env;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image_path>", args[0]);
        std::process::exit(1);
    }

    let image_path = &args[1];
    let img = ImageReader::open(image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgba8();

    println!("Loaded image: {}x{}", img.width(), img.height());

    let options = DetectionOptions::default();
    let colors = dominant_colors(&img, &options);
    let source = Arc::new(img);

    // Example 1: Stop after region splitting to see raw region sizes
    println!("\n=== Regions Only ===");
    let regions_pipeline = Pipeline::new()
        .add_step_boxed(Box::new(ColorMaskStep { tolerance: 40.0 }))
        .add_step_boxed(Box::new(MaskCleanupStep { radius: 5 }))
        .add_step_boxed(Box::new(RegionSplitStep { min_area: 100 }));

    for (i, cluster) in colors.iter().enumerate() {
        let regions = regions_pipeline.run(PipelineData::for_color(source.clone(), cluster.color), i + 1)?;
        println!("  {}: {} regions", cluster.color.css(), regions.len());
        for region in regions.iter().take(10) {
            println!("    {} px", region.get_int(REGION_PIXELS).unwrap_or(0));
        }
    }

    // Example 2: Full chain with coarser simplification and no cleanup
    println!("\n\n=== Custom Pipeline (No Cleanup, Coarse Outlines) ===");
    let custom_pipeline = Pipeline::new()
        .add_step_boxed(Box::new(ColorMaskStep { tolerance: 30.0 }))
        .add_step_boxed(Box::new(RegionSplitStep { min_area: 500 }))
        .add_step_boxed(Box::new(ContourTraceStep))
        .add_step_boxed(Box::new(AreaFilterStep { min_area: 500.0, max_area: f64::INFINITY }))
        .add_step_boxed(Box::new(SimplifyStep {
            tolerance: 20.0,
            corner_angle_threshold: 30.0,
            min_area: 500.0,
            max_area: f64::INFINITY,
        }));

    println!("Steps: {}", custom_pipeline.step_names().join(" → "));

    for (i, cluster) in colors.iter().enumerate() {
        let outlines = custom_pipeline.run_with_executor(PipelineData::for_color(source.clone(), cluster.color), i + 1)?;
        println!("  {}: {} outlines", cluster.color.css(), outlines.len());
        for outline in &outlines {
            if let Payload::Polygon(points) = &outline.payload {
                let area = outline.get_float(CONTOUR_AREA).unwrap_or(0.0);
                println!("    {} vertices, area {:.0}", points.len(), area);
            }
        }

        // Only the first two steps, for comparison
        let masks = custom_pipeline.run_partial(PipelineData::for_color(source.clone(), cluster.color), i + 1, 2)?;
        println!("  (first two steps alone: {} items)", masks.len());
    }

    Ok(())
}

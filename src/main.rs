use anyhow::Context;
use clap::Parser;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use floorplan_zones::detection::tuning::{compare_parameters, preset_parameter_sets, suggest_parameters};
use floorplan_zones::{assign_apartments, ApartmentDetector, ApartmentRecord, DetectedPolygon, DetectionOptions, Preset};

#[derive(Parser)]
#[command(name = "floorplan-zones")]
#[command(about = "Detect apartment outlines in color-coded floor plans")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Start from a parameter preset
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// JSON file with detection options (camelCase keys), applied over the preset
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Smallest apartment area in pixels
    #[arg(long, value_name = "PIXELS")]
    min_area: Option<u32>,

    /// Largest apartment area in pixels
    #[arg(long, value_name = "PIXELS")]
    max_area: Option<f64>,

    #[arg(long)]
    color_tolerance: Option<f64>,

    #[arg(long)]
    simplify_tolerance: Option<f64>,

    #[arg(long, value_name = "PIXELS")]
    morph_radius: Option<u32>,

    /// Minimum turn angle for a corner, in degrees
    #[arg(long, value_name = "DEGREES")]
    corner_angle: Option<f64>,

    /// Number of apartment fill colors to look for
    #[arg(long, value_name = "N")]
    colors: Option<usize>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// JSON list of apartments to pair with the detected polygons
    #[arg(long, value_name = "FILE")]
    apartments: Option<PathBuf>,

    /// Print JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Print parameters suggested for this image and exit
    #[arg(long, conflicts_with = "compare")]
    suggest: bool,

    /// Run every preset and compare the results
    #[arg(long)]
    compare: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Preset, then config file, then individual flags
    fn detection_options(&self) -> anyhow::Result<DetectionOptions> {
        let mut options = self.preset.map(|p| p.options()).unwrap_or_default();

        if let Some(config_path) = &self.config {
            let text = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config {}", config_path.display()))?;
            let overrides: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in {}", config_path.display()))?;
            options = merge_options(options, overrides)?;
        }

        if let Some(min_area) = self.min_area {
            options.min_area = Some(min_area);
        }
        if let Some(max_area) = self.max_area {
            options.max_area = Some(max_area);
        }
        if let Some(tolerance) = self.color_tolerance {
            options.color_tolerance = tolerance;
        }
        if let Some(tolerance) = self.simplify_tolerance {
            options.simplify_tolerance = tolerance;
        }
        if let Some(radius) = self.morph_radius {
            options.morph_radius = radius;
        }
        if let Some(angle) = self.corner_angle {
            options.corner_angle_threshold = angle;
        }
        if let Some(colors) = self.colors {
            options.dominant_colors = colors;
        }

        Ok(options)
    }
}

/// Overlay the keys present in `overrides` onto `base`
fn merge_options(base: DetectionOptions, overrides: serde_json::Value) -> anyhow::Result<DetectionOptions> {
    let serde_json::Value::Object(overrides) = overrides else {
        anyhow::bail!("Detection options must be a JSON object");
    };

    let mut merged = serde_json::to_value(base)?;
    if let serde_json::Value::Object(fields) = &mut merged {
        fields.extend(overrides);
    }
    Ok(serde_json::from_value(merged)?)
}

async fn load_rgba(path: &Path) -> anyhow::Result<RgbaImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await?
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    Ok(image.to_rgba8())
}

fn print_polygons(polygons: &[DetectedPolygon]) {
    println!("\n=== Apartment Detection Results ===");
    println!("Total polygons detected: {}", polygons.len());

    if polygons.is_empty() {
        println!("No apartments detected. Try --suggest or a lower --min-area.");
        return;
    }

    println!("\nDetected polygons:");
    for (i, polygon) in polygons.iter().enumerate() {
        let bbox = &polygon.bounding_box;
        println!(
            "  #{} {} at ({:.0}, {:.0}) size {:.0}x{:.0}, area {:.0}, {} vertices",
            i + 1,
            polygon.color.as_deref().unwrap_or("-"),
            bbox.x,
            bbox.y,
            bbox.width,
            bbox.height,
            polygon.area,
            polygon.points.len()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if args.suggest {
        let image = load_rgba(&args.image_path).await?;
        let suggested = tokio::task::spawn_blocking(move || suggest_parameters(&image)).await?;
        println!("{}", serde_json::to_string_pretty(&suggested)?);
        return Ok(());
    }

    if args.compare {
        let image = load_rgba(&args.image_path).await?;
        let results =
            tokio::task::spawn_blocking(move || compare_parameters(&image, &preset_parameter_sets())).await??;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            println!("\n=== Preset Comparison ===");
            println!("{:<18} {:>8} {:>12}", "preset", "polygons", "avg area");
            for result in &results {
                println!("{:<18} {:>8} {:>12.0}", result.name, result.polygon_count, result.average_area);
            }
        }
        return Ok(());
    }

    let options = args.detection_options()?;
    log::debug!("Detection options: {:?}", options);

    let mut detector = ApartmentDetector::new(options);
    if args.verbose {
        detector = detector.with_progress(Arc::new(|stage, percent| {
            log::debug!("[{:>3.0}%] {}", percent, stage);
        }));
    }
    if let Some(debug_dir) = args.debug_out.clone() {
        detector = detector.with_debug_dir(debug_dir)?;
    }

    let detection = detector.detect_file(&args.image_path).await?;
    let polygons = detection.polygons;

    if let Some(apartments_path) = &args.apartments {
        let text = tokio::fs::read_to_string(apartments_path)
            .await
            .with_context(|| format!("Failed to read {}", apartments_path.display()))?;
        let apartments: Vec<ApartmentRecord> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid apartment list in {}", apartments_path.display()))?;

        let zones = assign_apartments(&polygons, &apartments);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&zones)?);
        } else {
            print_polygons(&polygons);
            println!("\nZones:");
            for (i, zone) in zones.iter().enumerate() {
                println!("  #{} → {} ({})", i + 1, zone.label, zone.display.stroke_color);
            }
        }
    } else if args.json {
        println!("{}", serde_json::to_string_pretty(&polygons)?);
    } else {
        print_polygons(&polygons);
    }

    if let Some(debug_dir) = &args.debug_out {
        println!("\nDebug output written to {}", debug_dir.display());
    }

    Ok(())
}

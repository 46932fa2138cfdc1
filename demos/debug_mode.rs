use floorplan_zones::{ApartmentDetector, DetectionOptions};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let image_path = std::env::args().nth(1).unwrap_or_else(|| "floor_plan.png".to_string());
    println!("Testing debug mode with lineage tracking...\n");

    let debug_dir = PathBuf::from("debug_output");

    // Remove directory if it exists (for testing)
    if debug_dir.exists() {
        std::fs::remove_dir_all(&debug_dir)?;
    }

    let detector = ApartmentDetector::new(DetectionOptions::default())
        .with_progress(Arc::new(|stage, percent| println!("[{:>3.0}%] {}", percent, stage)))
        .with_debug_dir(debug_dir.clone())?;

    let detection = detector.detect_file(&image_path).await?;

    println!("\n✓ Detection completed!");
    println!("  Found {} apartment polygons", detection.polygons.len());
    println!("\nDebug outputs saved to: {}/", debug_dir.display());
    println!("\nDirectory structure:");
    println!("  00_original.png        - Input image");
    println!("  01_color_clusters.png  - Pixels painted with their apartment color");
    println!("  02_masks/              - Raw mask per apartment color");
    println!("  03_cleaned_masks/      - Masks after morphological cleanup");
    println!("  04_contours.png        - Detected polygons over the input");
    println!("  steps/                 - Every pipeline step, one image per item (color → region → outline)");

    println!("\nExample files:");
    let steps_dir = debug_dir.join("steps");
    if let Ok(entries) = std::fs::read_dir(&steps_dir) {
        let mut dirs: Vec<_> = entries.flatten().map(|e| e.path()).collect();
        dirs.sort();
        for dir in dirs {
            let count = std::fs::read_dir(&dir).map(|e| e.count()).unwrap_or(0);
            println!("  {} ({} images)", dir.display(), count);
        }
    }

    Ok(())
}

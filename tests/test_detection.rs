mod common;

use common::*;
use floorplan_zones::detect_apartment_polygons;
use floorplan_zones::detection::tuning::{compare_parameters, preset_parameter_sets};
use floorplan_zones::geometry::{point_in_polygon, polygon_area};
use image::DynamicImage;

fn detect(image: image::RgbaImage, options: DetectionOptions) -> Vec<DetectedPolygon> {
    ApartmentDetector::new(options)
        .detect(&DynamicImage::ImageRgba8(image))
        .expect("detection failed")
        .polygons
}

#[test]
fn test_solid_rectangle_yields_one_polygon() {
    let polygons = detect(solid_rectangle_plan(APARTMENT_GREEN), DetectionOptions::default());

    assert_eq!(polygons.len(), 1);
    let polygon = &polygons[0];
    let bbox = polygon.bounding_box;
    assert!(bbox.x <= 8.0 && bbox.y <= 8.0, "{:?}", bbox);
    assert!(bbox.max_x() >= 192.0 && bbox.max_y() >= 192.0, "{:?}", bbox);
    assert!((4..=8).contains(&polygon.points.len()), "{} vertices", polygon.points.len());
    assert_eq!(polygon.color.as_deref(), Some("rgb(120,190,110)"));
}

#[test]
fn test_same_color_blobs_are_separate_polygons() {
    let image = floor_plan(
        200,
        200,
        &[room(20, 20, 70, 70, APARTMENT_BLUE), room(120, 120, 170, 170, APARTMENT_BLUE)],
    );
    let polygons = detect(image, DetectionOptions::default());

    assert_eq!(polygons.len(), 2);
    assert!(polygons[0].centroid.y < polygons[1].centroid.y);
    assert!(polygons.iter().all(|p| p.area == 49.0 * 49.0));
}

#[test]
fn test_blob_below_min_area_is_ignored() {
    let image = floor_plan(200, 200, &[room(100, 100, 110, 110, APARTMENT_ORANGE)]);
    assert!(detect(image, DetectionOptions::default()).is_empty());
}

#[test]
fn test_blank_image_yields_nothing() {
    let image = floor_plan(100, 100, &[]);
    assert!(detect(image, DetectionOptions::default()).is_empty());
}

#[test]
fn test_detection_is_deterministic() {
    let first = detect(two_row_building(), DetectionOptions::default());
    let second = detect(two_row_building(), DetectionOptions::default());
    assert_eq!(first, second);
}

#[test]
fn test_two_color_building_in_reading_order() {
    let polygons = detect(two_row_building(), DetectionOptions::default());
    assert_eq!(polygons.len(), 6);

    for pair in polygons.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if (a.centroid.y - b.centroid.y).abs() > 50.0 {
            assert!(a.centroid.y < b.centroid.y);
        } else {
            assert!(a.centroid.x < b.centroid.x);
        }
    }

    // Colors alternate like a checkerboard
    let green = APARTMENT_GREEN.css();
    let labels: Vec<bool> = polygons.iter().map(|p| p.color.as_deref() == Some(green.as_str())).collect();
    assert_eq!(labels, vec![true, false, true, false, true, false]);
}

#[test]
fn test_polygon_invariants() {
    let polygons = detect(two_row_building(), DetectionOptions::default());
    assert!(!polygons.is_empty());

    for polygon in &polygons {
        assert!(polygon.points.len() >= 3);
        assert!(polygon.bounding_box.contains(&polygon.centroid));
        assert!(point_in_polygon(&polygon.centroid, &polygon.points));
        assert!(polygon.area >= 693.0);
    }
}

#[test]
fn test_area_bounds_are_respected() {
    let too_small_max = DetectionOptions::default().with_max_area(5000.0);
    assert!(detect(two_row_building(), too_small_max).is_empty());

    let options = DetectionOptions::default().with_min_area(1000).with_max_area(20_000.0);
    let polygons = detect(two_row_building(), options);
    assert_eq!(polygons.len(), 6);
    assert!(polygons.iter().all(|p| p.area >= 1000.0 && p.area <= 20_000.0));
    for polygon in &polygons {
        let area = polygon_area(&polygon.points);
        assert!((1000.0..=20_000.0).contains(&area), "outline area {}", area);
    }
}

#[test]
fn test_outline_area_stays_in_range_when_simplification_grows_it() {
    // A 100x50 block with a small bump on top. The traced contour is in
    // range, but simplifying away the bump can push the outline past it.
    let image = floor_plan(
        200,
        120,
        &[room(40, 40, 140, 90, APARTMENT_GREEN), room(70, 33, 110, 40, APARTMENT_GREEN)],
    );
    let (min_area, max_area) = (5050, 5150.0);
    let options = DetectionOptions {
        morph_radius: 1,
        ..DetectionOptions::default()
    }
    .with_min_area(min_area)
    .with_max_area(max_area);

    for polygon in detect(image, options) {
        let area = polygon_area(&polygon.points);
        assert!(area >= min_area as f64 && area <= max_area, "outline area {}", area);
        assert!(polygon.area >= min_area as f64 && polygon.area <= max_area);
    }
}

#[test]
fn test_single_dominant_color() {
    let options = DetectionOptions {
        dominant_colors: 1,
        ..DetectionOptions::default()
    };
    let polygons = detect(two_row_building(), options);
    assert_eq!(polygons.len(), 3);

    let first_color = polygons[0].color.clone();
    assert!(polygons.iter().all(|p| p.color == first_color));
}

#[test]
fn test_polygon_json_shape() {
    let polygons = detect(solid_rectangle_plan(APARTMENT_BLUE), DetectionOptions::default());
    let json = serde_json::to_value(&polygons[0]).unwrap();

    assert!(json["points"][0].is_array());
    assert_eq!(json["points"][0].as_array().unwrap().len(), 2);
    assert!(json["boundingBox"]["width"].is_number());
    assert!(json["centroid"]["x"].is_number());
    assert_eq!(json["color"], "rgb(90,140,220)");

    let back: DetectedPolygon = serde_json::from_value(json).unwrap();
    assert_eq!(back.points.len(), polygons[0].points.len());
    assert_eq!(back.color, polygons[0].color);
}

#[tokio::test]
async fn test_detect_from_file() -> anyhow::Result<()> {
    let file = write_png(&two_row_building());

    let polygons = detect_apartment_polygons(file.path(), DetectionOptions::default()).await?;
    assert_eq!(polygons.len(), 6);

    Ok(())
}

#[tokio::test]
async fn test_undecodable_file_is_an_error() {
    let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    std::fs::write(file.path(), b"definitely not a png").unwrap();

    let result = detect_apartment_polygons(file.path(), DetectionOptions::default()).await;
    assert!(matches!(result, Err(DetectionError::ImageDecode(_))));
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = detect_apartment_polygons(dir.path().join("nope.png"), DetectionOptions::default()).await;
    assert!(matches!(result, Err(DetectionError::ImageRead { .. })));
}

#[tokio::test]
async fn test_debug_output_directory() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let out = dir.path().join("debug");
    let file = write_png(&two_row_building());

    let detection = ApartmentDetector::new(DetectionOptions::default())
        .with_debug_dir(out.clone())?
        .detect_file(file.path())
        .await?;

    assert!(detection.debug.is_some());
    assert!(out.join("00_original.png").exists());
    assert!(out.join("01_color_clusters.png").exists());
    assert!(out.join("04_contours.png").exists());
    assert_eq!(std::fs::read_dir(out.join("02_masks"))?.count(), 2);
    assert_eq!(std::fs::read_dir(out.join("03_cleaned_masks"))?.count(), 2);
    assert!(out.join("steps/00_input/01.png").exists());
    assert!(out.join("steps/01_color_mask/02-01.png").exists());

    Ok(())
}

#[test]
fn test_debug_detector_can_run_twice() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let out = dir.path().join("dbg");
    let detector = ApartmentDetector::new(DetectionOptions::default()).with_debug_dir(out.clone())?;
    let image = DynamicImage::ImageRgba8(two_row_building());

    let first = detector.detect(&image)?;
    let second = detector.detect(&image)?;

    assert_eq!(first.polygons, second.polygons);
    assert!(out.join("steps/01_color_mask/01-01.png").exists());
    assert!(out.join("04_contours.png").exists());

    Ok(())
}

#[test]
fn test_debug_directory_must_be_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("leftover.png"), b"x").unwrap();

    let result = ApartmentDetector::new(DetectionOptions::default()).with_debug_dir(dir.path().to_path_buf());
    assert!(matches!(result, Err(DetectionError::DebugOutput(_))));
}

#[test]
fn test_every_preset_finds_the_building() {
    let results = compare_parameters(&two_row_building(), &preset_parameter_sets()).unwrap();

    assert_eq!(results.len(), Preset::ALL.len());
    for result in &results {
        assert_eq!(result.polygon_count, 6, "preset {}", result.name);
        assert!(result.average_area > 10_000.0);
    }
}

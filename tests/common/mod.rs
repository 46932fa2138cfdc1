mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from floorplan_zones for tests
pub use floorplan_zones::{
    ApartmentDetector, BoundingBox, Color, DetectedPolygon, DetectionError, DetectionOptions, Point,
    Preset,
};

pub mod detection;
pub mod error;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod zones;

pub use models::{BoundingBox, Color, ColorCluster, DetectedPolygon, Point};
pub use error::{DetectionError, Result};
pub use detection::{detect_apartment_polygons, ApartmentDetector, Detection, ProgressFn};
pub use detection::options::{DetectionOptions, Preset};
pub use pipeline::{
    Pipeline, PipelineData, PipelineStep, PipelineContext,
    Payload, MetadataValue, WorkItem, PipelineExecutor, DebugConfig
};
pub use zones::{assign_apartments, ApartmentRecord, ZoneDraft};

use std::path::PathBuf;

use thiserror::Error;

/// Errors that fail a whole detection call.
///
/// Problems with individual regions are never errors; they are logged and
/// the region is dropped.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DetectionError {
    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("debug directory is not empty: {0}")]
    DebugOutput(String),

    #[error("pipeline failed: {0}")]
    Pipeline(#[from] anyhow::Error),

    #[error("detection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, DetectionError>;

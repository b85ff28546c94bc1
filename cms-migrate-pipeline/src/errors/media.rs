//! Error types for the media pipeline.
use std::path::PathBuf;

use thiserror::Error;

/// Errors affecting a single media file. Always recoverable: the pipeline
/// logs them and moves on to the next file.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error on {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Conversion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl MediaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}

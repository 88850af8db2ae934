//! Download error types.

use thiserror::Error;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors raised by individual download strategies.
///
/// Only [`DownloadError::Exhausted`] ever leaves the agent; the others are
/// caught and trigger the next strategy.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to configure download client: {0}")]
    ConfigError(String),

    #[error("Failed to fetch file: {0}")]
    Fetch(String),

    #[error("Canvas fallback unavailable: {0}")]
    CanvasUnavailable(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Save failed: {0}")]
    Save(String),

    #[error("Failed to open externally: {0}")]
    Open(String),

    #[error("All download strategies failed: {0}")]
    Exhausted(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn canvas_unavailable(msg: impl Into<String>) -> Self {
        Self::CanvasUnavailable(msg.into())
    }

    pub fn save(msg: impl Into<String>) -> Self {
        Self::Save(msg.into())
    }
}

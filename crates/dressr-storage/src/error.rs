//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during an upload.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Failed to get signed URL: {0}")]
    UploadUrl(String),

    #[error("Failed to upload file: {0}")]
    UploadTransfer(String),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn upload_url(msg: impl Into<String>) -> Self {
        Self::UploadUrl(msg.into())
    }

    pub fn upload_transfer(msg: impl Into<String>) -> Self {
        Self::UploadTransfer(msg.into())
    }
}

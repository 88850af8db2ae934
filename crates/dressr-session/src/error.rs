//! Session error types.

use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please upload an image first.")]
    NoUploadedAsset,

    #[error("Another operation is in progress ({0})")]
    Busy(&'static str),

    #[error("No result to download")]
    NothingToDownload,

    #[error("Upload failed: {0}")]
    Upload(#[from] dressr_storage::StorageError),

    #[error("Generation failed: {0}")]
    Job(#[from] dressr_jobs::JobError),

    #[error("Download failed: {0}")]
    Download(#[from] dressr_media::DownloadError),
}

impl SessionError {
    /// Rejections of a user action, as opposed to failed network flows.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SessionError::NoUploadedAsset | SessionError::Busy(_) | SessionError::NothingToDownload
        )
    }
}

//! Job client error types.

use thiserror::Error;

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to configure job client: {0}")]
    ConfigError(String),

    #[error("Failed to submit job: {0}")]
    JobSubmit(String),

    #[error("Failed to check status: {0}")]
    StatusCheck(String),

    /// The service reported `failed` or `error` for the job.
    #[error("{0}")]
    JobFailed(String),

    #[error("Job timed out after {0} polls")]
    JobTimeout(u32),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No media URL in job result")]
    MissingResultUrl,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JobError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

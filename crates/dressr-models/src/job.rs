//! Generation job definitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::job_status::{GenerationResult, JobStatus, JobStatusResponse};

/// Identifier assigned to a job by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which submission endpoint and payload shape a job uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    #[default]
    Image,
    Video,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Image => "image",
            JobKind::Video => "video",
        }
    }

    /// Path segment of the job API for this kind.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            JobKind::Image => "image-gen",
            JobKind::Video => "video-gen",
        }
    }

    /// Model name sent in the submission body.
    pub fn model(&self) -> &'static str {
        match self {
            JobKind::Image => "image-effects",
            JobKind::Video => "video-effects",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown job kind: {0} (expected \"image\" or \"video\")")]
pub struct ParseJobKindError(String);

impl FromStr for JobKind {
    type Err = ParseJobKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "image-effects" => Ok(JobKind::Image),
            "video" | "video-effects" => Ok(JobKind::Video),
            other => Err(ParseJobKindError(other.to_string())),
        }
    }
}

/// Visibility of the generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputVisibility {
    #[default]
    Private,
    Public,
}

impl OutputVisibility {
    pub fn is_private(&self) -> bool {
        matches!(self, OutputVisibility::Private)
    }
}

/// Whether the service watermark is stripped from the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Watermark {
    #[default]
    Removed,
    Kept,
}

impl Watermark {
    pub fn is_removed(&self) -> bool {
        matches!(self, Watermark::Removed)
    }
}

/// A request to transform an uploaded asset. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationJobRequest {
    /// Public URL of the uploaded source asset
    pub source_media_url: String,
    /// Effect to apply
    pub effect_id: String,
    /// Owner the job is filed under
    pub owner_id: String,
    /// Output visibility
    #[serde(default)]
    pub output_visibility: OutputVisibility,
    /// Watermark handling
    #[serde(default)]
    pub watermark: Watermark,
    /// Submission kind
    #[serde(default)]
    pub kind: JobKind,
}

impl GenerationJobRequest {
    pub fn new(
        source_media_url: impl Into<String>,
        effect_id: impl Into<String>,
        owner_id: impl Into<String>,
        kind: JobKind,
    ) -> Self {
        Self {
            source_media_url: source_media_url.into(),
            effect_id: effect_id.into(),
            owner_id: owner_id.into(),
            output_visibility: OutputVisibility::default(),
            watermark: Watermark::default(),
            kind,
        }
    }

    pub fn with_visibility(mut self, visibility: OutputVisibility) -> Self {
        self.output_visibility = visibility;
        self
    }

    pub fn with_watermark(mut self, watermark: Watermark) -> Self {
        self.watermark = watermark;
        self
    }
}

/// A submitted job as last observed from the status endpoint.
///
/// The job is only ever updated from a fetched status response; nothing
/// changes it locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Service job ID
    pub job_id: JobId,
    /// Submission kind
    pub kind: JobKind,
    /// Last observed status
    pub status: JobStatus,
    /// Result payload, once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    /// Service-provided error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Number of status responses observed
    pub polls: u32,
    /// When the job was submitted
    pub submitted_at: DateTime<Utc>,
    /// When the status was last fetched
    pub updated_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn new(job_id: JobId, kind: JobKind) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            kind,
            status: JobStatus::Queued,
            result: None,
            error_message: None,
            polls: 0,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// Record a fetched status response.
    pub fn observe(&mut self, response: JobStatusResponse) {
        self.status = response.status;
        if response.result.is_some() {
            self.result = response.result;
        }
        if response.error.is_some() {
            self.error_message = response.error;
        }
        self.polls += 1;
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Time from submission to the last fetched status.
    pub fn elapsed(&self) -> Duration {
        self.updated_at - self.submitted_at
    }

    /// URL of the produced media, if the job completed with one.
    pub fn media_url(&self) -> Option<&str> {
        self.result.as_ref().and_then(GenerationResult::media_url)
    }
}

//! Job status responses from the generation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result fields checked, in order, for the produced media URL.
const MEDIA_URL_FIELDS: [&str; 3] = ["mediaUrl", "video", "image"];

/// Job processing status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting for a worker
    #[default]
    Queued,
    /// Job is actively being processed
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed
    Failed,
    /// Service reported an error
    Error,
    /// Any status this client does not know; polling continues
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Error => "error",
            JobStatus::Unknown => "unknown",
        }
    }

    /// Check if this is a terminal state (no more polling).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Error
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of the job status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default = "unknown_status")]
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn unknown_status() -> JobStatus {
    JobStatus::Unknown
}

/// Result payload of a completed job.
///
/// The service returns either a single object or an array whose first
/// element describes the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationResult(pub Value);

impl GenerationResult {
    /// The first item of the result.
    pub fn primary(&self) -> Option<&Value> {
        match &self.0 {
            Value::Array(items) => items.first(),
            Value::Null => None,
            other => Some(other),
        }
    }

    /// URL of the produced media (`mediaUrl`, then `video`, then `image`).
    pub fn media_url(&self) -> Option<&str> {
        let item = self.primary()?;
        MEDIA_URL_FIELDS
            .iter()
            .filter_map(|field| item.get(field).and_then(Value::as_str))
            .find(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> JobStatusResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_failure());
        assert!(JobStatus::Error.is_failure());
        assert!(!JobStatus::Unknown.is_terminal());
    }

    #[test]
    fn test_unknown_and_missing_status() {
        assert_eq!(parse(json!({"status": "rendering"})).status, JobStatus::Unknown);
        assert_eq!(parse(json!({})).status, JobStatus::Unknown);
    }

    #[test]
    fn test_media_url_single_object() {
        let response = parse(json!({
            "status": "completed",
            "result": {"mediaUrl": "https://cdn/out.png"}
        }));
        assert_eq!(
            response.result.unwrap().media_url(),
            Some("https://cdn/out.png")
        );
    }

    #[test]
    fn test_media_url_array_fallback_fields() {
        let response = parse(json!({
            "status": "completed",
            "result": [{"video": "https://cdn/out.mp4"}, {"image": "https://cdn/ignored.png"}]
        }));
        assert_eq!(
            response.result.unwrap().media_url(),
            Some("https://cdn/out.mp4")
        );

        let result = GenerationResult(json!({"mediaUrl": "", "image": "https://cdn/i.jpg"}));
        assert_eq!(result.media_url(), Some("https://cdn/i.jpg"));
    }

    #[test]
    fn test_media_url_missing() {
        assert_eq!(GenerationResult(json!([])).media_url(), None);
        assert_eq!(GenerationResult(json!({"other": 1})).media_url(), None);
        assert_eq!(GenerationResult(Value::Null).media_url(), None);
    }
}

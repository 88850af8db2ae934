//! Job API request/response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use dressr_models::{GenerationJobRequest, JobId, JobKind};

/// Submission body for image jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSubmission {
    pub model: String,
    pub tool_type: String,
    pub effect_id: String,
    pub image_url: String,
    pub user_id: String,
    pub remove_watermark: bool,
    pub is_private: bool,
}

/// Submission body for video jobs. The source goes in a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSubmission {
    pub image_url: Vec<String>,
    pub effect_id: String,
    pub user_id: String,
    pub remove_watermark: bool,
    pub model: String,
    pub is_private: bool,
}

/// Body posted to the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SubmissionBody {
    Image(ImageSubmission),
    Video(VideoSubmission),
}

impl SubmissionBody {
    /// Build the payload shape matching the request kind.
    pub fn for_request(request: &GenerationJobRequest) -> Self {
        let model = request.kind.model().to_string();
        let remove_watermark = request.watermark.is_removed();
        let is_private = request.output_visibility.is_private();

        match request.kind {
            JobKind::Image => SubmissionBody::Image(ImageSubmission {
                tool_type: model.clone(),
                model,
                effect_id: request.effect_id.clone(),
                image_url: request.source_media_url.clone(),
                user_id: request.owner_id.clone(),
                remove_watermark,
                is_private,
            }),
            JobKind::Video => SubmissionBody::Video(VideoSubmission {
                image_url: vec![request.source_media_url.clone()],
                effect_id: request.effect_id.clone(),
                user_id: request.owner_id.clone(),
                remove_watermark,
                model,
                is_private,
            }),
        }
    }
}

/// Response from the submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedJob {
    #[serde(rename = "jobId")]
    pub job_id: JobId,
    /// Remaining fields, kept as returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

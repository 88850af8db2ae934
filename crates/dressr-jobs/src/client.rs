//! Generation job API client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use tracing::{debug, info, warn};

use dressr_models::{GenerationJob, GenerationJobRequest, JobId, JobKind, JobStatusResponse};

use crate::error::{JobError, JobResult};
use crate::types::{SubmissionBody, SubmittedJob};

/// Accept header sent with every job API request.
const ACCEPT_ANY: &str = "application/json, text/plain, */*";

/// Message used when the service fails a job without saying why.
const DEFAULT_FAILURE_MESSAGE: &str = "Job processing failed";

/// Configuration for the job client.
#[derive(Debug, Clone)]
pub struct JobClientConfig {
    /// Base URL of the job API
    pub api_base_url: String,
    /// Fixed owner identifier jobs are filed under
    pub owner_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Maximum number of status requests per job
    pub max_polls: u32,
}

impl Default for JobClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.chromastudio.ai".to_string(),
            owner_id: "DObRu1vyStbUynoQmTcHBlhs55z2".to_string(),
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(2000),
            max_polls: 60, // 120 seconds at the default interval
        }
    }
}

impl JobClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("DRESSR_API_BASE_URL").unwrap_or(defaults.api_base_url),
            owner_id: std::env::var("DRESSR_OWNER_ID").unwrap_or(defaults.owner_id),
            timeout: Duration::from_secs(
                std::env::var("DRESSR_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            poll_interval: Duration::from_millis(
                std::env::var("DRESSR_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            max_polls: std::env::var("DRESSR_MAX_POLLS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Total time budget of one polling run.
    pub fn poll_budget(&self) -> Duration {
        self.poll_interval * self.max_polls
    }
}

/// Client for the generation job API.
#[derive(Clone)]
pub struct JobClient {
    http: Client,
    config: JobClientConfig,
}

impl JobClient {
    /// Create a new job client.
    pub fn new(config: JobClientConfig) -> JobResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_ANY));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JobError::ConfigError(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> JobResult<Self> {
        Self::new(JobClientConfig::from_env())
    }

    pub fn config(&self) -> &JobClientConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    fn submit_url(&self, kind: JobKind) -> String {
        format!("{}/{}", self.base_url(), kind.endpoint_path())
    }

    fn status_url(&self, job_id: &JobId, kind: JobKind) -> String {
        format!(
            "{}/{}/{}/{}/status",
            self.base_url(),
            kind.endpoint_path(),
            self.config.owner_id,
            job_id
        )
    }

    /// Submit a generation job. At most one POST per call, never retried.
    pub async fn submit(&self, request: &GenerationJobRequest) -> JobResult<SubmittedJob> {
        let url = self.submit_url(request.kind);
        let body = SubmissionBody::for_request(request);

        debug!(kind = %request.kind, effect_id = %request.effect_id, "Submitting job to {}", url);

        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            metrics::counter!("dressr_job_submissions_total", "outcome" => "rejected")
                .increment(1);
            warn!(%status, "Job submission rejected");
            return Err(JobError::JobSubmit(status.to_string()));
        }

        let text = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let submitted: SubmittedJob = serde_json::from_value(value)
            .map_err(|e| JobError::invalid_response(format!("missing job ID: {}", e)))?;

        metrics::counter!("dressr_job_submissions_total", "outcome" => "accepted").increment(1);
        info!(job_id = %submitted.job_id, kind = %request.kind, "Job submitted");
        Ok(submitted)
    }

    /// Fetch the current status of a job once.
    pub async fn check_status(&self, job_id: &JobId, kind: JobKind) -> JobResult<JobStatusResponse> {
        let url = self.status_url(job_id, kind);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(job_id = %job_id, %status, "Status check rejected");
            return Err(JobError::StatusCheck(status.to_string()));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Poll a job until it reaches a terminal state.
    ///
    /// Issues at most `max_polls` sequential status requests, `poll_interval`
    /// apart. `on_progress` receives the 1-based attempt number after every
    /// non-terminal response. An HTTP failure aborts immediately with
    /// [`JobError::StatusCheck`]; a `failed`/`error` status aborts with
    /// [`JobError::JobFailed`].
    pub async fn poll<F>(&self, job_id: &JobId, kind: JobKind, mut on_progress: F) -> JobResult<GenerationJob>
    where
        F: FnMut(u32),
    {
        let max_polls = self.config.max_polls;
        let mut job = GenerationJob::new(job_id.clone(), kind);

        for attempt in 1..=max_polls {
            metrics::counter!("dressr_job_polls_total").increment(1);
            let response = self.check_status(job_id, kind).await?;
            job.observe(response);

            if job.status.is_failure() {
                let message = job
                    .error_message
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                warn!(job_id = %job_id, attempt, status = %job.status, "Job failed: {}", message);
                return Err(JobError::job_failed(message));
            }

            if job.is_terminal() {
                info!(
                    job_id = %job_id,
                    attempt,
                    elapsed_ms = job.elapsed().num_milliseconds(),
                    "Job completed"
                );
                return Ok(job);
            }

            debug!(job_id = %job_id, attempt, status = %job.status, "Job not finished yet");
            on_progress(attempt);

            if attempt < max_polls {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        warn!(job_id = %job_id, max_polls, "Job polling budget exhausted");
        Err(JobError::JobTimeout(max_polls))
    }
}

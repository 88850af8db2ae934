//! Signed-URL upload client implementation.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use dressr_models::{generate_name, LocalFile, DEFAULT_NAME_LENGTH};

use crate::error::{StorageError, StorageResult};

/// Prefix of every uploaded object key.
const STORAGE_PREFIX: &str = "media";

/// Extension used when the selected file has none.
const FALLBACK_EXTENSION: &str = "jpg";

/// Configuration for the storage uploader.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Endpoint issuing signed upload URLs
    pub upload_url_endpoint: String,
    /// Project scope passed to the issuance endpoint
    pub project_id: String,
    /// Base of public asset URLs
    pub asset_base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_url_endpoint: "https://core.faceswapper.ai/media/get-upload-url".to_string(),
            project_id: "dressr".to_string(),
            asset_base_url: "https://assets.dressr.ai/".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upload_url_endpoint: std::env::var("DRESSR_UPLOAD_URL_ENDPOINT")
                .unwrap_or(defaults.upload_url_endpoint),
            project_id: std::env::var("DRESSR_PROJECT_ID").unwrap_or(defaults.project_id),
            asset_base_url: std::env::var("DRESSR_ASSET_BASE_URL")
                .unwrap_or(defaults.asset_base_url),
            timeout: Duration::from_secs(
                std::env::var("DRESSR_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

/// A single-use upload slot. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Storage key, unique within the storage path
    pub file_name: String,
    /// Time-limited URL accepting one PUT
    pub signed_url: String,
    /// Where the object is served from after upload
    pub public_url: String,
}

/// Uploads files through the two-phase signed-URL protocol.
#[derive(Clone)]
pub struct StorageUploader {
    http: Client,
    config: StorageConfig,
}

impl StorageUploader {
    /// Create a new uploader.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::config_error(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(StorageConfig::from_env())
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Derive a fresh storage key: `media/{name}.{ext}`.
    pub fn storage_key(file: &LocalFile) -> String {
        let extension = file.extension().unwrap_or(FALLBACK_EXTENSION);
        format!(
            "{}/{}.{}",
            STORAGE_PREFIX,
            generate_name(DEFAULT_NAME_LENGTH),
            extension
        )
    }

    /// Public URL of a storage key. No network round trip.
    pub fn public_url(&self, key: &str) -> String {
        let base = self.config.asset_base_url.trim_end_matches('/');
        format!("{}/{}", base, key)
    }

    /// Derive a key and obtain a signed URL for it.
    pub async fn prepare(&self, file: &LocalFile) -> StorageResult<UploadTarget> {
        let file_name = Self::storage_key(file);
        let signed_url = self.request_signed_url(&file_name).await?;
        let public_url = self.public_url(&file_name);

        Ok(UploadTarget {
            file_name,
            signed_url,
            public_url,
        })
    }

    /// Upload a file and return its public URL.
    ///
    /// No retries: the first failure ends the attempt. A failed transfer
    /// may leave a partial object behind.
    pub async fn upload(&self, file: &LocalFile) -> StorageResult<String> {
        let target = self.prepare(file).await?;

        if let Err(e) = self.transfer(&target, file).await {
            metrics::counter!("dressr_uploads_total", "outcome" => "failure").increment(1);
            return Err(e);
        }

        metrics::counter!("dressr_uploads_total", "outcome" => "success").increment(1);
        info!(
            storage_key = %target.file_name,
            bytes = file.len(),
            "Uploaded {}", file.name
        );
        Ok(target.public_url)
    }

    async fn request_signed_url(&self, key: &str) -> StorageResult<String> {
        debug!(storage_key = %key, "Requesting signed upload URL");

        let response = self
            .http
            .get(&self.config.upload_url_endpoint)
            .query(&[("fileName", key), ("projectId", self.config.project_id.as_str())])
            .send()
            .await
            .map_err(|e| StorageError::upload_url(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(storage_key = %key, %status, "Signed URL request rejected");
            return Err(StorageError::upload_url(status.to_string()));
        }

        let signed_url = response
            .text()
            .await
            .map_err(|e| StorageError::upload_url(e.to_string()))?
            .trim()
            .to_string();

        if signed_url.is_empty() {
            return Err(StorageError::upload_url("empty signed URL"));
        }

        Ok(signed_url)
    }

    async fn transfer(&self, target: &UploadTarget, file: &LocalFile) -> StorageResult<()> {
        debug!(
            storage_key = %target.file_name,
            content_type = %file.content_type,
            "Uploading {} bytes", file.len()
        );

        let response = self
            .http
            .put(&target.signed_url)
            .header(CONTENT_TYPE, file.content_type.as_str())
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|e| StorageError::upload_transfer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(storage_key = %target.file_name, %status, "Upload rejected");
            return Err(StorageError::upload_transfer(status.to_string()));
        }

        Ok(())
    }
}

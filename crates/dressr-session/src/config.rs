//! Session configuration.

use tracing::warn;

use dressr_jobs::JobClientConfig;
use dressr_media::DownloadConfig;
use dressr_models::{JobKind, OutputVisibility, Watermark};
use dressr_storage::StorageConfig;

/// Effect applied when none is configured.
pub const DEFAULT_EFFECT_ID: &str = "simpsonsCharacter";

/// What every job of the session asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub effect_id: String,
    pub kind: JobKind,
    pub visibility: OutputVisibility,
    pub watermark: Watermark,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            effect_id: DEFAULT_EFFECT_ID.to_string(),
            kind: JobKind::Image,
            visibility: OutputVisibility::Private,
            watermark: Watermark::Removed,
        }
    }
}

impl GenerationSettings {
    /// Create settings from environment variables.
    pub fn from_env() -> Self {
        let kind = match std::env::var("DRESSR_JOB_KIND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                warn!("Ignoring DRESSR_JOB_KIND: {}", e);
                JobKind::Image
            }),
            Err(_) => JobKind::Image,
        };

        Self {
            effect_id: std::env::var("DRESSR_EFFECT_ID")
                .unwrap_or_else(|_| DEFAULT_EFFECT_ID.to_string()),
            kind,
            ..Self::default()
        }
    }
}

/// Configuration for a whole session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub storage: StorageConfig,
    pub jobs: JobClientConfig,
    pub download: DownloadConfig,
    pub generation: GenerationSettings,
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            storage: StorageConfig::from_env(),
            jobs: JobClientConfig::from_env(),
            download: DownloadConfig::from_env(),
            generation: GenerationSettings::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generation_settings() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.effect_id, "simpsonsCharacter");
        assert_eq!(settings.kind, JobKind::Image);
        assert!(settings.visibility.is_private());
        assert!(settings.watermark.is_removed());
    }
}

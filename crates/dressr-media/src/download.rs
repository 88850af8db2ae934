//! Best-effort result download.
//!
//! Strategies run in a fixed order and each one's failure is the trigger for
//! the next:
//!
//! 1. [`DownloadStrategy::BinaryFetch`]: fetch the URL and save the bytes.
//!    Fails when the asset host refuses the request.
//! 2. [`DownloadStrategy::Canvas`]: re-encode the presented image as PNG.
//!    Only for images that are visible and fully decoded.
//! 3. [`DownloadStrategy::ExternalTab`]: open the URL in the browser and ask
//!    the user to save it by hand.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use dressr_models::{classify, generate_name, MediaKind, SHORT_NAME_LENGTH};

use crate::canvas::LoadedImage;
use crate::error::{DownloadError, DownloadResult};
use crate::sink::{DirectorySink, ExternalOpener, SaveSink, SystemOpener};

/// Shown to the user when only the external fallback worked.
pub const MANUAL_SAVE_NOTICE: &str =
    "Direct download failed. The file will open in a new tab.\nRight-click and select \"Save as...\" to download.";

/// Configuration for the download agent.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directory results are saved into
    pub output_dir: PathBuf,
    /// Request timeout for the binary fetch
    pub timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            timeout: Duration::from_secs(120),
        }
    }
}

impl DownloadConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            output_dir: std::env::var("DRESSR_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("downloads")),
            timeout: Duration::from_secs(
                std::env::var("DRESSR_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

/// A way of getting the result onto the user's machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadStrategy {
    BinaryFetch,
    Canvas,
    ExternalTab,
}

impl DownloadStrategy {
    /// Order in which strategies are attempted.
    pub const ORDER: [DownloadStrategy; 3] = [
        DownloadStrategy::BinaryFetch,
        DownloadStrategy::Canvas,
        DownloadStrategy::ExternalTab,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStrategy::BinaryFetch => "binary_fetch",
            DownloadStrategy::Canvas => "canvas",
            DownloadStrategy::ExternalTab => "external_tab",
        }
    }
}

impl std::fmt::Display for DownloadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a successful download did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was written locally.
    Saved {
        path: PathBuf,
        file_name: String,
        strategy: DownloadStrategy,
    },
    /// The URL was handed to the browser; the user saves it manually.
    OpenedExternally { url: String },
}

impl DownloadOutcome {
    pub fn strategy(&self) -> DownloadStrategy {
        match self {
            DownloadOutcome::Saved { strategy, .. } => *strategy,
            DownloadOutcome::OpenedExternally { .. } => DownloadStrategy::ExternalTab,
        }
    }
}

/// Pick a file extension for a downloaded result.
///
/// Each kind matches on either the content type or the URL, checked in the
/// order video, png, webp; anything else saves as `jpg`.
pub fn infer_extension(content_type: Option<&str>, url: &str) -> &'static str {
    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    let url = url.to_ascii_lowercase();

    if content_type.contains("video") || url.contains(".mp4") || url.contains(".webm") {
        "mp4"
    } else if content_type.contains("png") || url.contains(".png") {
        "png"
    } else if content_type.contains("webp") || url.contains(".webp") {
        "webp"
    } else {
        "jpg"
    }
}

fn result_file_name(extension: &str) -> String {
    format!("result_{}.{}", generate_name(SHORT_NAME_LENGTH), extension)
}

/// Downloads result media with layered fallbacks.
#[derive(Clone)]
pub struct DownloadAgent {
    http: Client,
    sink: Arc<dyn SaveSink>,
    opener: Arc<dyn ExternalOpener>,
}

impl DownloadAgent {
    /// Create an agent saving into `output_dir` and opening the system browser.
    pub fn new(config: DownloadConfig) -> DownloadResult<Self> {
        let sink = Arc::new(DirectorySink::new(config.output_dir.clone()));
        Self::with_handlers(config, sink, Arc::new(SystemOpener))
    }

    /// Create from environment variables.
    pub fn from_env() -> DownloadResult<Self> {
        Self::new(DownloadConfig::from_env())
    }

    /// Create with custom save and open handlers.
    pub fn with_handlers(
        config: DownloadConfig,
        sink: Arc<dyn SaveSink>,
        opener: Arc<dyn ExternalOpener>,
    ) -> DownloadResult<Self> {
        // reqwest keeps no cookie store unless asked, so fetches go out
        // without credentials.
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DownloadError::ConfigError(e.to_string()))?;

        Ok(Self { http, sink, opener })
    }

    /// Download `url`, falling back through every strategy.
    ///
    /// `presented` is the image currently shown for this result, if it is
    /// visible and fully decoded. Returns [`DownloadError::Exhausted`] only
    /// when even the external open failed.
    pub async fn download(
        &self,
        url: &str,
        presented: Option<&LoadedImage>,
    ) -> DownloadResult<DownloadOutcome> {
        let mut last_error = None;

        for strategy in DownloadStrategy::ORDER {
            let attempt = match strategy {
                DownloadStrategy::BinaryFetch => self.fetch_and_save(url).await,
                DownloadStrategy::Canvas => self.save_from_canvas(url, presented).await,
                DownloadStrategy::ExternalTab => self.open_externally(url).await,
            };

            match attempt {
                Ok(outcome) => {
                    metrics::counter!(
                        "dressr_downloads_total",
                        "strategy" => strategy.as_str(),
                        "outcome" => "success"
                    )
                    .increment(1);
                    return Ok(outcome);
                }
                Err(e) => {
                    metrics::counter!(
                        "dressr_downloads_total",
                        "strategy" => strategy.as_str(),
                        "outcome" => "failure"
                    )
                    .increment(1);
                    warn!(%strategy, "Download strategy failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(DownloadError::Exhausted(
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }

    /// Fetch and decode an image, as a rendering surface would.
    pub async fn load_image(&self, url: &str) -> DownloadResult<LoadedImage> {
        let (bytes, _) = self.fetch(url).await?;
        LoadedImage::decode(url, &bytes)
    }

    async fn fetch(&self, url: &str) -> DownloadResult<(Vec<u8>, Option<String>)> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::fetch(status.to_string()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        Ok((bytes, content_type))
    }

    async fn fetch_and_save(&self, url: &str) -> DownloadResult<DownloadOutcome> {
        let (bytes, content_type) = self.fetch(url).await?;
        let extension = infer_extension(content_type.as_deref(), url);
        let file_name = result_file_name(extension);

        debug!(
            content_type = content_type.as_deref().unwrap_or(""),
            "Fetched {} bytes from {}", bytes.len(), url
        );

        let path = self.sink.save(&file_name, bytes).await?;
        info!(file_name = %file_name, "Downloaded result");

        Ok(DownloadOutcome::Saved {
            path,
            file_name,
            strategy: DownloadStrategy::BinaryFetch,
        })
    }

    async fn save_from_canvas(
        &self,
        url: &str,
        presented: Option<&LoadedImage>,
    ) -> DownloadResult<DownloadOutcome> {
        if classify(url) == MediaKind::Video {
            return Err(DownloadError::canvas_unavailable("result is a video"));
        }

        let image = presented
            .filter(|image| image.src == url)
            .ok_or_else(|| DownloadError::canvas_unavailable("no decoded image on display"))?;

        if !image.is_complete() {
            return Err(DownloadError::canvas_unavailable("image not fully decoded"));
        }

        let png = image.to_png()?;
        let file_name = result_file_name("png");
        let path = self.sink.save(&file_name, png).await?;
        info!(file_name = %file_name, "Saved result from decoded image");

        Ok(DownloadOutcome::Saved {
            path,
            file_name,
            strategy: DownloadStrategy::Canvas,
        })
    }

    async fn open_externally(&self, url: &str) -> DownloadResult<DownloadOutcome> {
        self.opener.open(url).await?;
        info!("Opened {} for manual save", url);

        Ok(DownloadOutcome::OpenedExternally {
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ExternalOpener for RecordingOpener {
        async fn open(&self, url: &str) -> DownloadResult<()> {
            if self.fail {
                return Err(DownloadError::Open("no browser".to_string()));
            }
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn agent(dir: &std::path::Path, opener: Arc<RecordingOpener>) -> DownloadAgent {
        let config = DownloadConfig {
            output_dir: dir.to_path_buf(),
            timeout: Duration::from_secs(5),
        };
        DownloadAgent::with_handlers(config, Arc::new(DirectorySink::new(dir)), opener).unwrap()
    }

    fn assert_result_name(file_name: &str, extension: &str) {
        let id = file_name
            .strip_prefix("result_")
            .and_then(|rest| rest.strip_suffix(&format!(".{}", extension)))
            .unwrap_or_else(|| panic!("unexpected file name {}", file_name));
        assert_eq!(id.len(), SHORT_NAME_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_infer_extension() {
        assert_eq!(infer_extension(Some("image/png"), "https://x/out"), "png");
        assert_eq!(infer_extension(Some("video/mp4"), "https://x/out.png"), "mp4");
        assert_eq!(infer_extension(Some("image/webp"), "https://x/out"), "webp");
        assert_eq!(infer_extension(Some("image/jpeg"), "https://x/out.png"), "png");
        assert_eq!(infer_extension(Some("image/jpeg"), "https://x/out"), "jpg");
        assert_eq!(infer_extension(Some("image/png"), "https://x/out.mp4"), "mp4");
        assert_eq!(infer_extension(Some("application/octet-stream"), "https://x/a.WEBM"), "mp4");
        assert_eq!(infer_extension(None, "https://x/a.png?sig=1"), "png");
        assert_eq!(infer_extension(None, "https://x/a.webp"), "webp");
        assert_eq!(infer_extension(None, "https://x/a"), "jpg");
    }

    #[tokio::test]
    async fn test_binary_fetch_saves_with_content_type_extension() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/out"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![9u8, 8, 7]),
            )
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let opener = Arc::new(RecordingOpener::default());
        let outcome = agent(tmp.path(), opener.clone())
            .download(&format!("{}/out", server.uri()), None)
            .await
            .unwrap();

        match outcome {
            DownloadOutcome::Saved {
                path,
                file_name,
                strategy,
            } => {
                assert_eq!(strategy, DownloadStrategy::BinaryFetch);
                assert_result_name(&file_name, "png");
                assert_eq!(std::fs::read(path).unwrap(), vec![9, 8, 7]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_canvas_fallback_when_fetch_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let url = format!("{}/out.jpg", server.uri());
        let presented = LoadedImage::new(url.clone(), RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])));

        let tmp = tempfile::tempdir().unwrap();
        let opener = Arc::new(RecordingOpener::default());
        let outcome = agent(tmp.path(), opener.clone())
            .download(&url, Some(&presented))
            .await
            .unwrap();

        match outcome {
            DownloadOutcome::Saved {
                path,
                file_name,
                strategy,
            } => {
                assert_eq!(strategy, DownloadStrategy::Canvas);
                assert_result_name(&file_name, "png");
                let saved = LoadedImage::decode("saved", &std::fs::read(path).unwrap()).unwrap();
                assert_eq!(saved.natural_width(), 4);
                assert_eq!(saved.natural_height(), 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_external_fallback_for_video() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/out.mp4", server.uri());
        // A decoded image for some other URL must not be used.
        let stale = LoadedImage::new("https://cdn/old.png", RgbaImage::from_pixel(1, 1, Rgba([0; 4])));

        let tmp = tempfile::tempdir().unwrap();
        let opener = Arc::new(RecordingOpener::default());
        let outcome = agent(tmp.path(), opener.clone())
            .download(&url, Some(&stale))
            .await
            .unwrap();

        assert_eq!(outcome, DownloadOutcome::OpenedExternally { url: url.clone() });
        assert_eq!(*opener.opened.lock().unwrap(), vec![url]);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_all_strategies_failing_is_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let opener = Arc::new(RecordingOpener {
            fail: true,
            ..Default::default()
        });
        let err = agent(tmp.path(), opener)
            .download(&format!("{}/out.png", server.uri()), None)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Exhausted(ref m) if m.contains("no browser")));
    }

    #[tokio::test]
    async fn test_load_image_decodes() {
        let server = MockServer::start().await;
        let png = LoadedImage::new("src", RgbaImage::from_pixel(2, 2, Rgba([5, 5, 5, 255])))
            .to_png()
            .unwrap();
        Mock::given(method("GET"))
            .and(path("/out.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let url = format!("{}/out.png", server.uri());
        let loaded = agent(tmp.path(), Arc::new(RecordingOpener::default()))
            .load_image(&url)
            .await
            .unwrap();
        assert_eq!(loaded.src, url);
        assert_eq!(loaded.natural_width(), 2);
    }
}

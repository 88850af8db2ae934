//! Session controller.
//!
//! Drives one session through upload, submit, poll and presentation. The
//! state lives behind a mutex that is never held across an `.await`; each
//! flow captures the epoch it started under and commits its results only
//! while that epoch is still current.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use dressr_jobs::{JobClient, JobError};
use dressr_media::{DownloadAgent, DownloadOutcome, LoadedImage, MANUAL_SAVE_NOTICE};
use dressr_models::{classify, GenerationJobRequest, LocalFile};
use dressr_storage::StorageUploader;

use crate::config::{GenerationSettings, SessionConfig};
use crate::error::{SessionError, SessionResult};
use crate::observer::SessionObserver;
use crate::stage::MediaStage;
use crate::state::{Phase, SessionEvent, SessionState, SessionView};

/// Short status notices shown in place of the generate label after a failure.
pub const NOTICE_UPLOAD_FAILED: &str = "Upload Failed";
pub const NOTICE_ERROR: &str = "Error";

/// How a flow ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The flow ran to the end and its result is committed.
    Completed,
    /// A reset or new file selection started a new session mid-flight; the
    /// flow's late results were dropped.
    Superseded,
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    stage: MediaStage,
}

/// Owns the single active session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Mutex<Inner>>,
    uploader: StorageUploader,
    jobs: JobClient,
    downloads: DownloadAgent,
    settings: GenerationSettings,
    observer: Arc<dyn SessionObserver>,
}

impl SessionController {
    pub fn new(
        uploader: StorageUploader,
        jobs: JobClient,
        downloads: DownloadAgent,
        settings: GenerationSettings,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            uploader,
            jobs,
            downloads,
            settings,
            observer,
        }
    }

    /// Build every client from `config`.
    pub fn from_config(
        config: SessionConfig,
        observer: Arc<dyn SessionObserver>,
    ) -> SessionResult<Self> {
        Ok(Self::new(
            StorageUploader::new(config.storage)?,
            JobClient::new(config.jobs)?,
            DownloadAgent::new(config.download)?,
            config.generation,
            observer,
        ))
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn downloads(&self) -> &DownloadAgent {
        &self.downloads
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the session state.
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Snapshot of the presentation surfaces.
    pub fn stage(&self) -> MediaStage {
        self.lock().stage.clone()
    }

    pub fn view(&self) -> SessionView {
        self.lock().state.view()
    }

    pub fn phase(&self) -> Phase {
        self.lock().state.phase().clone()
    }

    /// Apply `event` and notify the observer.
    ///
    /// With `expected_epoch` set, the event is dropped when a new session
    /// started in the meantime. Returns the epoch after the commit, or `None`
    /// when nothing was applied.
    fn commit(&self, expected_epoch: Option<u64>, event: SessionEvent) -> Option<u64> {
        let (epoch, view) = {
            let mut guard = self.lock();
            let inner = &mut *guard;

            if let Some(expected) = expected_epoch {
                if inner.state.epoch() != expected {
                    debug!(
                        expected,
                        current = inner.state.epoch(),
                        event = event.name(),
                        "Dropping event from superseded session"
                    );
                    return None;
                }
            }

            if let Err(e) = inner.state.apply(event) {
                warn!("{}", e);
                return None;
            }

            inner.stage.sync(inner.state.phase());
            (inner.state.epoch(), inner.state.view())
        };

        self.observer.phase_changed(&view);
        Some(epoch)
    }

    /// Record a failed flow and surface it.
    ///
    /// A failure of a superseded flow is swallowed and reported as
    /// [`FlowOutcome::Superseded`].
    fn fail(
        &self,
        epoch: u64,
        event: SessionEvent,
        error: SessionError,
        message: &str,
    ) -> SessionResult<FlowOutcome> {
        let status = match event {
            SessionEvent::UploadFailed { .. } => NOTICE_UPLOAD_FAILED,
            _ => NOTICE_ERROR,
        };
        if self.commit(Some(epoch), event).is_none() {
            return Ok(FlowOutcome::Superseded);
        }
        self.observer.notice(status);
        self.observer.notice(&format!("Error: {}", message));
        Err(error)
    }

    /// Start a new session with `file` and upload it.
    ///
    /// Any flow still running for the previous session is superseded.
    pub async fn select_file(&self, file: LocalFile) -> SessionResult<FlowOutcome> {
        let Some(epoch) = self.commit(None, SessionEvent::FileSelected) else {
            return Ok(FlowOutcome::Superseded);
        };
        info!(epoch, file = %file.name, size = file.len(), "File selected");

        match self.uploader.upload(&file).await {
            Ok(asset_url) => {
                info!(epoch, asset_url = %asset_url, "Upload finished");
                let committed = self.commit(Some(epoch), SessionEvent::UploadSucceeded { asset_url });
                Ok(self.completed(committed))
            }
            Err(e) => {
                error!(epoch, "Upload error: {}", e);
                let message = e.to_string();
                self.fail(
                    epoch,
                    SessionEvent::UploadFailed {
                        message: message.clone(),
                    },
                    e.into(),
                    &message,
                )
            }
        }
    }

    /// Submit a job for the uploaded asset and poll it to completion.
    pub async fn generate(&self) -> SessionResult<FlowOutcome> {
        let snapshot = self.state();

        if snapshot.phase().is_busy() {
            return Err(SessionError::Busy(snapshot.phase().name()));
        }
        let Some(asset_url) = snapshot.uploaded_asset_url().map(str::to_string) else {
            let e = SessionError::NoUploadedAsset;
            self.observer.notice(&e.to_string());
            return Err(e);
        };

        let Some(epoch) = self.commit(Some(snapshot.epoch()), SessionEvent::SubmitStarted) else {
            return Err(SessionError::Busy(self.phase().name()));
        };

        let request = GenerationJobRequest::new(
            asset_url,
            self.settings.effect_id.as_str(),
            self.jobs.config().owner_id.as_str(),
            self.settings.kind,
        )
        .with_visibility(self.settings.visibility)
        .with_watermark(self.settings.watermark);

        info!(epoch, effect_id = %request.effect_id, kind = %request.kind, "Submitting job");

        let submitted = match self.jobs.submit(&request).await {
            Ok(submitted) => submitted,
            Err(e) => {
                error!(epoch, "Submit error: {}", e);
                let message = e.to_string();
                return self.fail(
                    epoch,
                    SessionEvent::SubmitFailed {
                        message: message.clone(),
                    },
                    e.into(),
                    &message,
                );
            }
        };

        let job_id = submitted.job_id;
        if self
            .commit(
                Some(epoch),
                SessionEvent::SubmitSucceeded {
                    job_id: job_id.clone(),
                },
            )
            .is_none()
        {
            return Ok(FlowOutcome::Superseded);
        }

        let progress = self.clone();
        let polled = self
            .jobs
            .poll(&job_id, self.settings.kind, move |attempt| {
                progress.commit(Some(epoch), SessionEvent::PollProgressed { attempt });
            })
            .await;

        let url = match polled.and_then(|job| {
            job.media_url()
                .map(str::to_string)
                .ok_or(JobError::MissingResultUrl)
        }) {
            Ok(url) => url,
            Err(e) => {
                error!(epoch, job_id = %job_id, "Generation error: {}", e);
                let message = e.to_string();
                return self.fail(
                    epoch,
                    SessionEvent::PollFailed {
                        message: message.clone(),
                    },
                    e.into(),
                    &message,
                );
            }
        };

        let kind = classify(&url);
        info!(epoch, job_id = %job_id, url = %url, kind = %kind, "Presenting result");

        let committed = self.commit(Some(epoch), SessionEvent::JobCompleted { url, kind });
        Ok(self.completed(committed))
    }

    /// Return to idle, invalidating every in-flight flow.
    pub fn reset(&self) {
        if let Some(epoch) = self.commit(None, SessionEvent::Reset) {
            info!(epoch, "Session reset");
        }
    }

    /// Report that the result image finished decoding.
    ///
    /// Returns `false` when `image` belongs to a result no longer shown.
    pub fn image_loaded(&self, image: LoadedImage) -> bool {
        let accepted = self.lock().stage.image_loaded(image);
        if !accepted {
            debug!("Ignoring decoded image for a stale source");
        }
        accepted
    }

    /// Download the presented result.
    pub async fn download(&self) -> SessionResult<DownloadOutcome> {
        let (url, presented) = {
            let inner = self.lock();
            match inner.state.phase() {
                Phase::Presenting { url, .. } => {
                    (url.clone(), inner.stage.canvas_source().cloned())
                }
                _ => return Err(SessionError::NothingToDownload),
            }
        };

        match self.downloads.download(&url, presented.as_ref()).await {
            Ok(outcome) => {
                if let DownloadOutcome::OpenedExternally { .. } = outcome {
                    self.observer.notice(MANUAL_SAVE_NOTICE);
                }
                Ok(outcome)
            }
            Err(e) => {
                error!(url = %url, "Download error: {}", e);
                self.observer.notice(&format!("Error: {}", e));
                Err(e.into())
            }
        }
    }

    fn completed(&self, committed: Option<u64>) -> FlowOutcome {
        match committed {
            Some(_) => FlowOutcome::Completed,
            None => FlowOutcome::Superseded,
        }
    }
}

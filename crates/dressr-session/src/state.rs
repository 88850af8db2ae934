//! Session state machine.
//!
//! All mutations go through [`SessionState::apply`]. Starting a new session
//! (selecting a file or resetting) bumps the epoch; flows remember the epoch
//! they started under and their late completions are dropped when it moved.

use std::fmt;

use thiserror::Error;

use dressr_models::{JobId, MediaKind};

pub const LABEL_GENERATE: &str = "Generate";
pub const LABEL_UPLOADING: &str = "Uploading...";
pub const LABEL_READY: &str = "Ready to Generate";
pub const LABEL_SUBMITTING: &str = "Submitting...";
pub const LABEL_QUEUED: &str = "Queued...";
pub const LABEL_GENERATE_AGAIN: &str = "Generate Again";

/// Where a failed flow stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Upload,
    Submit,
    Poll,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Upload => "upload",
            FailureStage::Submit => "submit",
            FailureStage::Poll => "poll",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phase of the single active session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Uploaded,
    Submitting,
    /// `attempt` is 0 until the first non-terminal status arrives.
    Polling { attempt: u32 },
    Presenting { url: String, kind: MediaKind },
    Failed { stage: FailureStage, message: String },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Uploaded => "uploaded",
            Phase::Submitting => "submitting",
            Phase::Polling { .. } => "polling",
            Phase::Presenting { .. } => "presenting",
            Phase::Failed { .. } => "failed",
        }
    }

    /// A network flow is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Phase::Uploading | Phase::Submitting | Phase::Polling { .. }
        )
    }

    /// Text of the generate control in this phase.
    pub fn label(&self) -> String {
        match self {
            Phase::Idle | Phase::Failed { .. } => LABEL_GENERATE.to_string(),
            Phase::Uploading => LABEL_UPLOADING.to_string(),
            Phase::Uploaded => LABEL_READY.to_string(),
            Phase::Submitting => LABEL_SUBMITTING.to_string(),
            Phase::Polling { attempt: 0 } => LABEL_QUEUED.to_string(),
            Phase::Polling { attempt } => format!("Processing... ({})", attempt),
            Phase::Presenting { .. } => LABEL_GENERATE_AGAIN.to_string(),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    FileSelected,
    UploadSucceeded { asset_url: String },
    UploadFailed { message: String },
    SubmitStarted,
    SubmitSucceeded { job_id: JobId },
    SubmitFailed { message: String },
    PollProgressed { attempt: u32 },
    JobCompleted { url: String, kind: MediaKind },
    PollFailed { message: String },
    Reset,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::FileSelected => "file_selected",
            SessionEvent::UploadSucceeded { .. } => "upload_succeeded",
            SessionEvent::UploadFailed { .. } => "upload_failed",
            SessionEvent::SubmitStarted => "submit_started",
            SessionEvent::SubmitSucceeded { .. } => "submit_succeeded",
            SessionEvent::SubmitFailed { .. } => "submit_failed",
            SessionEvent::PollProgressed { .. } => "poll_progressed",
            SessionEvent::JobCompleted { .. } => "job_completed",
            SessionEvent::PollFailed { .. } => "poll_failed",
            SessionEvent::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Event {event} is not valid while {phase}")]
pub struct TransitionError {
    pub phase: &'static str,
    pub event: &'static str,
}

/// Everything the session knows, independent of presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    phase: Phase,
    uploaded_asset_url: Option<String>,
    active_job_id: Option<JobId>,
    epoch: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn uploaded_asset_url(&self) -> Option<&str> {
        self.uploaded_asset_url.as_deref()
    }

    pub fn active_job_id(&self) -> Option<&JobId> {
        self.active_job_id.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// An asset is uploaded and nothing is in flight.
    pub fn can_generate(&self) -> bool {
        self.uploaded_asset_url.is_some() && !self.phase.is_busy()
    }

    /// Apply an event, or reject it without touching the state.
    pub fn apply(&mut self, event: SessionEvent) -> Result<(), TransitionError> {
        let rejected = TransitionError {
            phase: self.phase.name(),
            event: event.name(),
        };

        match event {
            SessionEvent::Reset => {
                self.begin_epoch();
                self.phase = Phase::Idle;
            }
            SessionEvent::FileSelected => {
                self.begin_epoch();
                self.phase = Phase::Uploading;
            }
            SessionEvent::UploadSucceeded { asset_url } if self.phase == Phase::Uploading => {
                self.uploaded_asset_url = Some(asset_url);
                self.phase = Phase::Uploaded;
            }
            SessionEvent::UploadFailed { message } if self.phase == Phase::Uploading => {
                self.phase = Phase::Failed {
                    stage: FailureStage::Upload,
                    message,
                };
            }
            SessionEvent::SubmitStarted if self.can_generate() => {
                self.active_job_id = None;
                self.phase = Phase::Submitting;
            }
            SessionEvent::SubmitSucceeded { job_id } if self.phase == Phase::Submitting => {
                self.active_job_id = Some(job_id);
                self.phase = Phase::Polling { attempt: 0 };
            }
            SessionEvent::SubmitFailed { message } if self.phase == Phase::Submitting => {
                self.phase = Phase::Failed {
                    stage: FailureStage::Submit,
                    message,
                };
            }
            SessionEvent::PollProgressed { attempt }
                if matches!(self.phase, Phase::Polling { .. }) =>
            {
                self.phase = Phase::Polling { attempt };
            }
            SessionEvent::JobCompleted { url, kind } if matches!(self.phase, Phase::Polling { .. }) => {
                self.active_job_id = None;
                self.phase = Phase::Presenting { url, kind };
            }
            SessionEvent::PollFailed { message } if matches!(self.phase, Phase::Polling { .. }) => {
                self.active_job_id = None;
                self.phase = Phase::Failed {
                    stage: FailureStage::Poll,
                    message,
                };
            }
            _ => return Err(rejected),
        }

        Ok(())
    }

    fn begin_epoch(&mut self) {
        self.epoch += 1;
        self.uploaded_asset_url = None;
        self.active_job_id = None;
    }

    /// What a front end should render for this state.
    pub fn view(&self) -> SessionView {
        let download_url = match &self.phase {
            Phase::Presenting { url, .. } => Some(url.clone()),
            _ => None,
        };

        SessionView {
            phase: self.phase.clone(),
            generate_label: self.phase.label(),
            generate_enabled: self.can_generate(),
            loading: self.phase.is_busy(),
            reset_visible: self.phase != Phase::Idle,
            download_url,
        }
    }
}

/// Render-ready projection of [`SessionState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: Phase,
    pub generate_label: String,
    pub generate_enabled: bool,
    pub loading: bool,
    pub reset_visible: bool,
    /// Set only while a result is presented.
    pub download_url: Option<String>,
}

impl SessionView {
    pub fn download_enabled(&self) -> bool {
        self.download_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded() -> SessionState {
        let mut state = SessionState::new();
        state.apply(SessionEvent::FileSelected).unwrap();
        state
            .apply(SessionEvent::UploadSucceeded {
                asset_url: "https://assets.example/media/a.jpg".to_string(),
            })
            .unwrap();
        state
    }

    fn polling() -> SessionState {
        let mut state = uploaded();
        state.apply(SessionEvent::SubmitStarted).unwrap();
        state
            .apply(SessionEvent::SubmitSucceeded {
                job_id: JobId::from_string("job-1"),
            })
            .unwrap();
        state
    }

    fn presenting() -> SessionState {
        let mut state = polling();
        state
            .apply(SessionEvent::JobCompleted {
                url: "https://cdn.example/out.png".to_string(),
                kind: MediaKind::Image,
            })
            .unwrap();
        state
    }

    #[test]
    fn test_initial_view() {
        let view = SessionState::new().view();
        assert_eq!(view.phase, Phase::Idle);
        assert_eq!(view.generate_label, "Generate");
        assert!(!view.generate_enabled);
        assert!(!view.reset_visible);
        assert!(!view.download_enabled());
    }

    #[test]
    fn test_happy_path_labels() {
        let mut state = SessionState::new();
        state.apply(SessionEvent::FileSelected).unwrap();
        assert_eq!(state.view().generate_label, "Uploading...");
        assert!(!state.view().generate_enabled);
        assert!(state.view().loading);

        state
            .apply(SessionEvent::UploadSucceeded {
                asset_url: "https://assets.example/media/a.jpg".to_string(),
            })
            .unwrap();
        assert_eq!(state.view().generate_label, "Ready to Generate");
        assert!(state.view().generate_enabled);

        state.apply(SessionEvent::SubmitStarted).unwrap();
        assert_eq!(state.view().generate_label, "Submitting...");
        assert!(!state.view().generate_enabled);

        state
            .apply(SessionEvent::SubmitSucceeded {
                job_id: JobId::from_string("job-1"),
            })
            .unwrap();
        assert_eq!(state.view().generate_label, "Queued...");
        assert_eq!(state.active_job_id().map(JobId::as_str), Some("job-1"));

        state.apply(SessionEvent::PollProgressed { attempt: 3 }).unwrap();
        assert_eq!(state.view().generate_label, "Processing... (3)");

        state
            .apply(SessionEvent::JobCompleted {
                url: "https://cdn.example/out.png".to_string(),
                kind: MediaKind::Image,
            })
            .unwrap();
        let view = state.view();
        assert_eq!(view.generate_label, "Generate Again");
        assert!(view.generate_enabled);
        assert!(!view.loading);
        assert_eq!(view.download_url.as_deref(), Some("https://cdn.example/out.png"));
        assert!(state.active_job_id().is_none());
    }

    #[test]
    fn test_submit_requires_uploaded_asset() {
        let mut state = SessionState::new();
        let err = state.apply(SessionEvent::SubmitStarted).unwrap_err();
        assert_eq!(err.phase, "idle");
        assert_eq!(err.event, "submit_started");
        assert_eq!(state.phase(), &Phase::Idle);
    }

    #[test]
    fn test_submit_rejected_while_busy() {
        let mut state = polling();
        assert!(state.apply(SessionEvent::SubmitStarted).is_err());
        assert!(matches!(state.phase(), Phase::Polling { attempt: 0 }));
    }

    #[test]
    fn test_upload_failure_leaves_generate_disabled() {
        let mut state = SessionState::new();
        state.apply(SessionEvent::FileSelected).unwrap();
        state
            .apply(SessionEvent::UploadFailed {
                message: "Failed to get signed URL: 500".to_string(),
            })
            .unwrap();

        let view = state.view();
        assert!(matches!(
            view.phase,
            Phase::Failed {
                stage: FailureStage::Upload,
                ..
            }
        ));
        assert_eq!(view.generate_label, "Generate");
        assert!(!view.generate_enabled);
        assert!(state.uploaded_asset_url().is_none());
    }

    #[test]
    fn test_poll_failure_keeps_asset_for_retry() {
        let mut state = polling();
        state
            .apply(SessionEvent::PollFailed {
                message: "nsfw".to_string(),
            })
            .unwrap();

        let view = state.view();
        assert_eq!(view.generate_label, "Generate");
        assert!(view.generate_enabled);
        assert!(state.active_job_id().is_none());
        assert!(state.uploaded_asset_url().is_some());

        state.apply(SessionEvent::SubmitStarted).unwrap();
        assert_eq!(state.phase(), &Phase::Submitting);
    }

    #[test]
    fn test_generate_again_from_presenting() {
        let mut state = presenting();
        state.apply(SessionEvent::SubmitStarted).unwrap();
        assert_eq!(state.phase(), &Phase::Submitting);
        assert!(state.view().download_url.is_none());
    }

    #[test]
    fn test_reset_from_every_phase() {
        let mut failed = uploaded();
        failed.apply(SessionEvent::SubmitStarted).unwrap();
        failed
            .apply(SessionEvent::SubmitFailed {
                message: "500".to_string(),
            })
            .unwrap();

        let mut submitting = uploaded();
        submitting.apply(SessionEvent::SubmitStarted).unwrap();

        let mut uploading = SessionState::new();
        uploading.apply(SessionEvent::FileSelected).unwrap();

        for mut state in [
            SessionState::new(),
            uploading,
            uploaded(),
            submitting,
            polling(),
            presenting(),
            failed,
        ] {
            let epoch = state.epoch();
            state.apply(SessionEvent::Reset).unwrap();

            assert_eq!(state.phase(), &Phase::Idle);
            assert!(state.uploaded_asset_url().is_none());
            assert!(state.active_job_id().is_none());
            assert_eq!(state.epoch(), epoch + 1);
            assert_eq!(state.view().generate_label, "Generate");
            assert!(!state.view().reset_visible);
        }
    }

    #[test]
    fn test_file_selected_starts_new_epoch() {
        let mut state = presenting();
        let epoch = state.epoch();

        state.apply(SessionEvent::FileSelected).unwrap();

        assert_eq!(state.epoch(), epoch + 1);
        assert_eq!(state.phase(), &Phase::Uploading);
        assert!(state.uploaded_asset_url().is_none());
    }

    #[test]
    fn test_late_events_after_reset_are_rejected() {
        let mut state = polling();
        state.apply(SessionEvent::Reset).unwrap();

        assert!(state
            .apply(SessionEvent::PollProgressed { attempt: 4 })
            .is_err());
        assert!(state
            .apply(SessionEvent::JobCompleted {
                url: "https://cdn.example/out.png".to_string(),
                kind: MediaKind::Image,
            })
            .is_err());
        assert_eq!(state.phase(), &Phase::Idle);
    }
}

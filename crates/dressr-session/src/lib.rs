//! Single-job session controller.
//!
//! This crate provides:
//! - The session state machine (upload, submit, poll, present)
//! - The presentation stage holding the result image/video elements
//! - Staleness protection for in-flight flows via a session epoch
//! - Configuration and logging setup for the `dressr` binary

pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod observer;
pub mod stage;
pub mod state;

pub use config::{GenerationSettings, SessionConfig};
pub use controller::{FlowOutcome, SessionController};
pub use error::{SessionError, SessionResult};
pub use observer::{NoopObserver, SessionObserver, TracingObserver};
pub use stage::{ImageElement, MediaStage, VideoElement};
pub use state::{FailureStage, Phase, SessionEvent, SessionState, SessionView, TransitionError};

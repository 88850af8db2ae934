//! Session change notifications.

use tracing::{info, warn};

use crate::state::SessionView;

/// Receives session updates.
///
/// Called outside the session lock, after the change is committed.
pub trait SessionObserver: Send + Sync {
    /// The phase changed; `view` is the new render state.
    fn phase_changed(&self, _view: &SessionView) {}

    /// A message the user should see, such as an error or a manual-save hint.
    fn notice(&self, _message: &str) {}
}

/// Ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Reports updates through tracing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn phase_changed(&self, view: &SessionView) {
        info!(
            phase = %view.phase,
            enabled = view.generate_enabled,
            "{}",
            view.generate_label
        );
    }

    fn notice(&self, message: &str) {
        warn!("{}", message);
    }
}

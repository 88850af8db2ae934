//! Result media download.
//!
//! This crate provides:
//! - A download agent trying binary fetch, canvas re-encode, then an external
//!   browser, in that order
//! - Decoded image snapshots used by the canvas fallback
//! - Save and open handlers for the local machine

pub mod canvas;
pub mod download;
pub mod error;
pub mod sink;

pub use canvas::LoadedImage;
pub use download::{
    infer_extension, DownloadAgent, DownloadConfig, DownloadOutcome, DownloadStrategy,
    MANUAL_SAVE_NOTICE,
};
pub use error::{DownloadError, DownloadResult};
pub use sink::{DirectorySink, ExternalOpener, SaveSink, SystemOpener};

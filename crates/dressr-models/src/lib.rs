//! Shared data models for the Dressr generation client.
//!
//! This crate provides Serde-serializable types for:
//! - Generation job requests and submission kinds
//! - Job status responses and result payloads
//! - Local files selected for upload
//! - Media classification and random name generation

pub mod file;
pub mod job;
pub mod job_status;
pub mod media;
pub mod utils;

// Re-export common types
pub use file::LocalFile;
pub use job::{
    GenerationJob, GenerationJobRequest, JobId, JobKind, OutputVisibility, ParseJobKindError,
    Watermark,
};
pub use job_status::{GenerationResult, JobStatus, JobStatusResponse};
pub use media::{classify, MediaKind};
pub use utils::{generate_name, DEFAULT_NAME_LENGTH, SHORT_NAME_LENGTH};

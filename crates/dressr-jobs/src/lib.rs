//! Client for the remote generation job API.
//!
//! Submits generation requests (image or video shape) and polls the job
//! status endpoint until the job completes, fails, or exhausts its poll
//! budget.

pub mod client;
pub mod error;
pub mod types;

pub use client::{JobClient, JobClientConfig};
pub use error::{JobError, JobResult};
pub use types::{ImageSubmission, SubmissionBody, SubmittedJob, VideoSubmission};

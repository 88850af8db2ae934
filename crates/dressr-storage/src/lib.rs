//! Object storage upload client.
//!
//! This crate provides:
//! - Storage key derivation for selected files
//! - Signed upload URL issuance
//! - Binary PUT transfer to the signed URL
//! - Public asset URL derivation

pub mod client;
pub mod error;

pub use client::{StorageConfig, StorageUploader, UploadTarget};
pub use error::{StorageError, StorageResult};

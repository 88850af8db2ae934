//! Local save and external open handlers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{DownloadError, DownloadResult};

/// Destination for downloaded bytes.
#[async_trait]
pub trait SaveSink: Send + Sync {
    /// Save `bytes` under `file_name` and return where they landed.
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> DownloadResult<PathBuf>;
}

/// Opens a URL outside this process, for the user to save by hand.
#[async_trait]
pub trait ExternalOpener: Send + Sync {
    async fn open(&self, url: &str) -> DownloadResult<()>;
}

/// Saves files into a directory.
///
/// Bytes are staged in a temporary file inside the directory and renamed into
/// place, so a partially written result never appears under its final name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SaveSink for DirectorySink {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> DownloadResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let dir = self.dir.clone();
        let target = self.dir.join(file_name);
        let destination = target.clone();

        tokio::task::spawn_blocking(move || -> DownloadResult<()> {
            let mut staged = tempfile::NamedTempFile::new_in(&dir)?;
            staged.write_all(&bytes)?;
            staged
                .persist(&destination)
                .map_err(|e| DownloadError::save(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| DownloadError::save(e.to_string()))??;

        info!("Saved {}", target.display());
        Ok(target)
    }
}

#[cfg(target_os = "macos")]
const OPEN_COMMAND: (&str, &[&str]) = ("open", &[]);

#[cfg(target_os = "windows")]
const OPEN_COMMAND: (&str, &[&str]) = ("cmd", &["/C", "start", ""]);

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPEN_COMMAND: (&str, &[&str]) = ("xdg-open", &[]);

/// Opens URLs with the platform's default browser.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener;

#[async_trait]
impl ExternalOpener for SystemOpener {
    async fn open(&self, url: &str) -> DownloadResult<()> {
        let (program, args) = OPEN_COMMAND;
        debug!("Opening {} with {}", url, program);

        let status = Command::new(program)
            .args(args)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| DownloadError::Open(format!("{}: {}", program, e)))?;

        if !status.success() {
            return Err(DownloadError::Open(format!("{} exited with {}", program, status)));
        }

        Ok(())
    }
}

//! Dressr CLI: upload a photo, run a generation effect, fetch the result.
//!
//! Endpoints and defaults come from `DRESSR_*` environment variables
//! (a `.env` file is honored).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use dressr_jobs::JobClient;
use dressr_media::{DownloadAgent, DownloadOutcome};
use dressr_models::{classify, JobId, JobKind, LocalFile, MediaKind, OutputVisibility, Watermark};
use dressr_session::logging::init_tracing;
use dressr_session::{SessionConfig, SessionController, TracingObserver};
use dressr_storage::StorageUploader;

#[derive(Parser)]
#[command(name = "dressr", version, about = "Dressr generation client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a photo, generate a result and download it
    Generate {
        /// Path to the photo
        file: PathBuf,
        /// Job kind: image or video
        #[arg(long)]
        kind: Option<JobKind>,
        /// Effect identifier
        #[arg(long)]
        effect: Option<String>,
        /// Make the output public
        #[arg(long)]
        public: bool,
        /// Keep the service watermark
        #[arg(long)]
        keep_watermark: bool,
        /// Directory to save the result into
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the result URL without downloading
        #[arg(long)]
        no_download: bool,
    },
    /// Upload a file and print its public URL
    Upload {
        /// Path to the file to upload
        file: PathBuf,
    },
    /// Check the status of a job once
    Status {
        /// Job identifier returned at submission
        job_id: String,
        /// Job kind: image or video
        #[arg(long)]
        kind: Option<JobKind>,
    },
    /// Download a result URL
    Download {
        /// Result URL
        url: String,
        /// Directory to save into
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn read_local_file(path: &Path) -> anyhow::Result<LocalFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(LocalFile::from_bytes(name, bytes))
}

fn print_outcome(outcome: &DownloadOutcome) -> anyhow::Result<()> {
    match outcome {
        DownloadOutcome::Saved {
            path,
            file_name,
            strategy,
        } => print_json(&serde_json::json!({
            "saved": path.display().to_string(),
            "file_name": file_name,
            "strategy": strategy.as_str(),
        })),
        DownloadOutcome::OpenedExternally { url } => {
            print_json(&serde_json::json!({ "opened": url }))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = SessionConfig::from_env();

    match cli.command {
        Commands::Generate {
            file,
            kind,
            effect,
            public,
            keep_watermark,
            output,
            no_download,
        } => {
            if let Some(kind) = kind {
                config.generation.kind = kind;
            }
            if let Some(effect) = effect {
                config.generation.effect_id = effect;
            }
            if public {
                config.generation.visibility = OutputVisibility::Public;
            }
            if keep_watermark {
                config.generation.watermark = Watermark::Kept;
            }
            if let Some(output) = output {
                config.download.output_dir = output;
            }

            let controller = SessionController::from_config(config, Arc::new(TracingObserver))
                .context("Failed to create session")?;

            let file = read_local_file(&file).await?;
            controller.select_file(file).await?;
            controller.generate().await?;

            let Some(url) = controller.view().download_url else {
                bail!("Session ended without a result");
            };
            println!("{}", url);

            if no_download {
                return Ok(());
            }

            if classify(&url) == MediaKind::Image {
                match controller.downloads().load_image(&url).await {
                    Ok(image) => {
                        controller.image_loaded(image);
                    }
                    Err(e) => warn!("Result image could not be decoded: {}", e),
                }
            }

            let outcome = controller.download().await?;
            print_outcome(&outcome)?;
        }
        Commands::Upload { file } => {
            let uploader =
                StorageUploader::new(config.storage).context("Failed to create uploader")?;
            let file = read_local_file(&file).await?;
            let url = uploader.upload(&file).await?;
            print_json(&serde_json::json!({ "url": url }))?;
        }
        Commands::Status { job_id, kind } => {
            let client = JobClient::new(config.jobs).context("Failed to create job client")?;
            let kind = kind.unwrap_or(config.generation.kind);
            let response = client
                .check_status(&JobId::from_string(job_id), kind)
                .await?;
            print_json(&response)?;
        }
        Commands::Download { url, output } => {
            if let Some(output) = output {
                config.download.output_dir = output;
            }
            let agent =
                DownloadAgent::new(config.download).context("Failed to create download agent")?;
            let outcome = agent.download(&url, None).await?;
            print_outcome(&outcome)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    info!("Starting dressr {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

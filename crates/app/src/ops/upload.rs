use std::path::PathBuf;

use clap::Args;

use common::prelude::*;
use common::upload::ProgressLedger;

use crate::state::UploaderKind;

/// Upload local files into the dropzone, one at a time.
#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Local files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target folder, relative to the dropzone root (defaults to the root)
    #[arg(long)]
    pub path: Option<String>,

    /// Override the configured uploader
    #[arg(long, value_enum)]
    pub uploader: Option<UploaderKind>,

    /// Print the batch summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not print progress to stderr
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Dropzone(#[from] DropzoneError),

    #[error("failed to render summary: {0}")]
    Render(#[from] serde_json::Error),

    #[error("{program} is not available: {install_hint}")]
    CliUnavailable {
        program: String,
        install_hint: &'static str,
    },
}

#[async_trait::async_trait]
impl crate::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let tasks = self
            .files
            .iter()
            .map(|path| UploadTask::from_path(path))
            .collect::<Result<Vec<_>, _>>()?;
        if tasks.is_empty() {
            return Err(DropzoneError::EmptyBatch.into());
        }

        // a missing CLI fails the whole command before connecting
        if let UploadStrategy::Cli(cli) = ctx.upload_strategy(self.uploader) {
            let availability = cli.check_availability().await;
            if !availability.available {
                return Err(UploadError::CliUnavailable {
                    program: availability.program,
                    install_hint: availability.install_hint,
                });
            }
            tracing::debug!(
                program = %availability.program,
                version = availability.version.as_deref().unwrap_or("unknown"),
                "cli uploader available"
            );
        }

        let (mut session, _) = ctx.connect(self.uploader).await?;
        if let Some(path) = &self.path {
            let prefix = session.navigation().resolve_path(path);
            session.load_folder(&prefix).await?;
        }
        tracing::info!(
            prefix = session.current_prefix(),
            files = tasks.len(),
            uploader = session.strategy().name(),
            "uploading"
        );

        let quiet = self.quiet;
        let (tx, rx) = progress_channel();
        let render = async move {
            let mut ledger = ProgressLedger::default();
            while let Ok(event) = rx.recv_async().await {
                ledger.observe(&event);
                if !quiet {
                    eprintln!("{}", render_event(&event));
                }
            }
            ledger
        };
        let (result, ledger) = tokio::join!(session.upload(&tasks, tx), render);
        let summary = result?;

        if !quiet {
            for event in ledger.missing_completions(&summary) {
                eprintln!("{}", render_event(&event));
            }
        }

        if self.json {
            return Ok(serde_json::to_string_pretty(&summary)?);
        }
        Ok(render_summary(&summary))
    }
}

/// One stderr line per event.
pub fn render_event(event: &UploadEvent) -> String {
    match event {
        UploadEvent::Progress {
            current_file,
            total_files,
            file_name,
            file_progress,
        } => format!(
            "[{}/{} {:>3}%] {} {:>3}%",
            current_file,
            total_files,
            event.overall_percent().unwrap_or_default().floor(),
            file_name,
            file_progress
        ),
        UploadEvent::CliLog {
            current_file,
            total_files,
            file_name,
            message,
        } => format!("[{}/{}] {}: {}", current_file, total_files, file_name, message),
        UploadEvent::Error {
            current_file,
            total_files,
            file_name,
            message,
        } => format!(
            "[{}/{}] {} failed: {}",
            current_file, total_files, file_name, message
        ),
    }
}

pub fn render_summary(summary: &BatchSummary) -> String {
    let mut lines = vec![format!(
        "Uploaded {} of {} file(s), {} failed",
        summary.success_count, summary.total_files, summary.error_count
    )];
    for outcome in &summary.results {
        match (&outcome.key, &outcome.error) {
            (Some(key), _) if outcome.success => {
                lines.push(format!("  ok     {} -> {}", outcome.file_name, key))
            }
            (_, Some(error)) => lines.push(format!("  failed {}: {}", outcome.file_name, error)),
            _ => lines.push(format!("  failed {}", outcome.file_name)),
        }
    }
    lines.join("\n")
}

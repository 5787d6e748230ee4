//! Batch uploads into the access scope.
//!
//! Files go one at a time through either the object store directly
//! ([`UploadStrategy::Sdk`]) or an external `aws s3 cp` process per file
//! ([`UploadStrategy::Cli`]). Per-file failures are recorded and the batch
//! moves on.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{DropzoneError, Result};

mod cli;
mod orchestrator;
mod progress;

pub use cli::{
    install_hint, parse_progress, store_uri, CliAvailability, CliUploader, DEFAULT_CLI_PROGRAM,
};
pub use orchestrator::{upload_batch, UploadContext};
pub use progress::{
    percent, progress_channel, FileReporter, ProgressLedger, ProgressReceiver, ProgressSender,
    ProgressTracker, UploadEvent,
};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One local file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
}

impl UploadTask {
    /// Build a task from a local path.
    ///
    /// Only a path without a file name is rejected here; a file that cannot
    /// be read fails later as a per-file upload error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| DropzoneError::Upload {
                file: path.display().to_string(),
                reason: "path has no file name".to_string(),
            })?;

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "could not read file size");
                0
            }
        };
        let content_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size,
            content_type,
        })
    }

    /// `prefix + fileName`; callers clamp `prefix` first.
    pub fn target_key(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.file_name)
    }
}

/// Per-file result recorded by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub file_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn succeeded(
        file_name: impl Into<String>,
        key: impl Into<String>,
        e_tag: Option<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            success: true,
            key: Some(key.into()),
            e_tag,
            error: None,
        }
    }

    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            success: false,
            key: None,
            e_tag: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregated batch result. `success` holds only when every file succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub success: bool,
    pub results: Vec<FileOutcome>,
    pub total_files: usize,
    pub success_count: usize,
    pub error_count: usize,
}

impl BatchSummary {
    pub fn from_results(results: Vec<FileOutcome>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let error_count = results.len() - success_count;
        Self {
            success: error_count == 0,
            total_files: results.len(),
            success_count,
            error_count,
            results,
        }
    }
}

/// How file bytes reach the store.
#[derive(Debug, Clone, Default)]
pub enum UploadStrategy {
    /// Direct puts through the object store, multipart above the threshold
    #[default]
    Sdk,
    /// One external CLI process per file
    Cli(CliUploader),
}

impl UploadStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sdk => "sdk",
            Self::Cli(_) => "cli",
        }
    }
}

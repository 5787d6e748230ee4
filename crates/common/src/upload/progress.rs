//! Upload progress events and the channel that carries them.
//!
//! Producers (the orchestrator and the uploaders) push [`UploadEvent`]s into
//! a flume channel; the display layer drains the receiver. Sends never block
//! and are dropped silently once the display side has gone away.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::BatchSummary;

pub type ProgressSender = flume::Sender<UploadEvent>;
pub type ProgressReceiver = flume::Receiver<UploadEvent>;

/// Create the producer/consumer pair for one batch.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    flume::unbounded()
}

/// `upload-progress` event delivered to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UploadEvent {
    #[serde(rename_all = "camelCase")]
    Progress {
        current_file: usize,
        total_files: usize,
        file_name: String,
        file_progress: u8,
    },
    #[serde(rename_all = "camelCase")]
    CliLog {
        current_file: usize,
        total_files: usize,
        file_name: String,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        current_file: usize,
        total_files: usize,
        file_name: String,
        message: String,
    },
}

impl UploadEvent {
    pub fn current_file(&self) -> usize {
        match self {
            Self::Progress { current_file, .. }
            | Self::CliLog { current_file, .. }
            | Self::Error { current_file, .. } => *current_file,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Progress { file_name, .. }
            | Self::CliLog { file_name, .. }
            | Self::Error { file_name, .. } => file_name,
        }
    }

    /// Whole-batch percentage for progress events.
    pub fn overall_percent(&self) -> Option<f64> {
        match self {
            Self::Progress {
                current_file,
                total_files,
                file_progress,
                ..
            } if *total_files > 0 => {
                let done = current_file.saturating_sub(1) as f64;
                let total = *total_files as f64;
                Some((done / total + f64::from(*file_progress) / 100.0 / total) * 100.0)
            }
            _ => None,
        }
    }
}

/// `floor(transferred / total * 100)`, clamped to 100. An empty file is complete.
pub fn percent(transferred: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (u128::from(transferred) * 100) / u128::from(total);
    pct.min(100) as u8
}

/// Drops repeated and regressing percentages for one file.
#[derive(Debug, Default, Clone)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    /// Returns the percentage if it should be emitted.
    pub fn observe(&mut self, pct: u8) -> Option<u8> {
        let pct = pct.min(100);
        match self.last {
            Some(last) if pct <= last => None,
            _ => {
                self.last = Some(pct);
                Some(pct)
            }
        }
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

/// Emits events for one file of a batch.
#[derive(Debug)]
pub struct FileReporter<'a> {
    events: &'a ProgressSender,
    current_file: usize,
    total_files: usize,
    file_name: &'a str,
    tracker: Mutex<ProgressTracker>,
}

impl<'a> FileReporter<'a> {
    pub fn new(
        events: &'a ProgressSender,
        current_file: usize,
        total_files: usize,
        file_name: &'a str,
    ) -> Self {
        Self {
            events,
            current_file,
            total_files,
            file_name,
            tracker: Mutex::default(),
        }
    }

    pub fn file_name(&self) -> &str {
        self.file_name
    }

    pub fn start(&self) {
        self.percent(0);
    }

    /// Byte progress callback.
    pub fn bytes(&self, transferred: u64, total: u64) {
        self.percent(percent(transferred, total));
    }

    pub fn percent(&self, pct: u8) {
        let emitted = self.tracker.lock().observe(pct);
        if let Some(file_progress) = emitted {
            self.send(UploadEvent::Progress {
                current_file: self.current_file,
                total_files: self.total_files,
                file_name: self.file_name.to_string(),
                file_progress,
            });
        }
    }

    /// Terminal 100% for a file that succeeded (no-op if already sent).
    pub fn complete(&self) {
        self.percent(100);
    }

    pub fn log(&self, message: impl Into<String>) {
        self.send(UploadEvent::CliLog {
            current_file: self.current_file,
            total_files: self.total_files,
            file_name: self.file_name.to_string(),
            message: message.into(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(UploadEvent::Error {
            current_file: self.current_file,
            total_files: self.total_files,
            file_name: self.file_name.to_string(),
            message: message.into(),
        });
    }

    fn send(&self, event: UploadEvent) {
        let _ = self.events.send(event);
    }
}

/// Display-side record of the last progress seen per file.
///
/// Used to synthesise a terminal 100% for files that finished without the
/// display ever receiving one.
#[derive(Debug, Default)]
pub struct ProgressLedger {
    last: HashMap<usize, u8>,
}

impl ProgressLedger {
    pub fn observe(&mut self, event: &UploadEvent) {
        if let UploadEvent::Progress {
            current_file,
            file_progress,
            ..
        } = event
        {
            let entry = self.last.entry(*current_file).or_insert(0);
            *entry = (*entry).max(*file_progress);
        }
    }

    pub fn last_progress(&self, current_file: usize) -> Option<u8> {
        self.last.get(&current_file).copied()
    }

    /// 100% events for successful files whose last seen progress was below 100.
    pub fn missing_completions(&self, summary: &BatchSummary) -> Vec<UploadEvent> {
        summary
            .results
            .iter()
            .enumerate()
            .filter(|(_, outcome)| outcome.success)
            .filter_map(|(idx, outcome)| {
                let current_file = idx + 1;
                match self.last_progress(current_file) {
                    Some(100) => None,
                    _ => Some(UploadEvent::Progress {
                        current_file,
                        total_files: summary.total_files,
                        file_name: outcome.file_name.clone(),
                        file_progress: 100,
                    }),
                }
            })
            .collect()
    }
}

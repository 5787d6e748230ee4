//! External `aws s3 cp` uploader.
//!
//! Each file gets its own process. Output from both streams is split on
//! `\n` and `\r` (the tool redraws its progress line in place), forwarded as
//! log events, and scanned for a `(NN%)` token.

use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;

use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use super::progress::FileReporter;
use crate::credentials::Credentials;
use crate::error::{DropzoneError, Result};

pub const DEFAULT_CLI_PROGRAM: &str = "aws";

const READ_BUFFER: usize = 4096;

#[derive(Debug, Clone)]
pub struct CliUploader {
    program: String,
}

impl Default for CliUploader {
    fn default() -> Self {
        Self::new(DEFAULT_CLI_PROGRAM)
    }
}

/// Result of probing for the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliAvailability {
    pub available: bool,
    pub program: String,
    pub version: Option<String>,
    pub install_hint: &'static str,
}

impl CliUploader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Upload one file to `key` under the access point.
    ///
    /// A nonzero exit code is an [`DropzoneError::Upload`] naming the code; a
    /// program that cannot be started is [`DropzoneError::ProcessSpawn`].
    pub async fn upload(
        &self,
        credentials: &Credentials,
        key: &str,
        path: &Path,
        reporter: &FileReporter<'_>,
    ) -> Result<()> {
        let uri = store_uri(credentials.access_point(), key);
        let mut command = Command::new(&self.program);
        command
            .arg("s3")
            .arg("cp")
            .arg(path)
            .arg(&uri)
            .arg("--region")
            .arg(credentials.region())
            .env("AWS_ACCESS_KEY_ID", credentials.access_key_id())
            .env("AWS_SECRET_ACCESS_KEY", credentials.secret_access_key())
            .env("AWS_DEFAULT_REGION", credentials.region())
            .env("AWS_REGION", credentials.region())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match credentials.session_token() {
            Some(token) => command.env("AWS_SESSION_TOKEN", token),
            None => command.env_remove("AWS_SESSION_TOKEN"),
        };

        debug!(program = %self.program, uri = %uri, "spawning uploader");
        let mut child = command
            .spawn()
            .map_err(|e| DropzoneError::ProcessSpawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        let (tx, rx) = flume::unbounded::<String>();
        let stdout = read_segments(child.stdout.take(), tx.clone());
        let stderr = read_segments(child.stderr.take(), tx);
        let consume = async {
            let mut last_line = None;
            while let Ok(line) = rx.recv_async().await {
                if let Some(pct) = parse_progress(&line) {
                    reporter.percent(pct);
                }
                reporter.log(line.clone());
                last_line = Some(line);
            }
            last_line
        };
        let ((), (), last_line) = tokio::join!(stdout, stderr, consume);

        let status = child.wait().await.map_err(|e| DropzoneError::Upload {
            file: reporter.file_name().to_string(),
            reason: format!("failed to wait for {}: {}", self.program, e),
        })?;

        if status.success() {
            return Ok(());
        }

        let exit = match status.code() {
            Some(code) => format!("exited with code {}", code),
            None => "was terminated by a signal".to_string(),
        };
        let reason = match last_line {
            Some(line) => format!("{} {}: {}", self.program, exit, line),
            None => format!("{} {}", self.program, exit),
        };
        warn!(file = reporter.file_name(), %reason, "uploader failed");
        Err(DropzoneError::Upload {
            file: reporter.file_name().to_string(),
            reason,
        })
    }

    /// Run `<program> --version` and report whether the CLI can be used.
    pub async fn check_availability(&self) -> CliAvailability {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let (available, version) = match output {
            Ok(output) if output.status.success() => {
                let text = if output.stdout.is_empty() {
                    output.stderr
                } else {
                    output.stdout
                };
                let version = String::from_utf8_lossy(&text)
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(str::to_string);
                (true, version)
            }
            Ok(output) => {
                debug!(program = %self.program, status = %output.status, "version probe failed");
                (false, None)
            }
            Err(e) => {
                debug!(program = %self.program, error = %e, "version probe could not start");
                (false, None)
            }
        };

        CliAvailability {
            available,
            program: self.program.clone(),
            version,
            install_hint: install_hint(),
        }
    }
}

/// `s3://<accessPoint>/<key>`
pub fn store_uri(access_point: &str, key: &str) -> String {
    format!("s3://{}/{}", access_point.trim_end_matches('/'), key)
}

fn progress_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\((\d{1,3})(?:\.\d+)?%\)").ok())
        .as_ref()
}

/// Extract the percentage from a `(NN%)` token. Values above 100 are ignored.
pub fn parse_progress(line: &str) -> Option<u8> {
    progress_pattern()?
        .captures_iter(line)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u8>().ok())
        .filter(|pct| *pct <= 100)
        .last()
}

/// How to install the CLI on this platform.
pub fn install_hint() -> &'static str {
    if cfg!(target_os = "macos") {
        "install the AWS CLI with `brew install awscli` or the pkg installer from https://aws.amazon.com/cli/"
    } else if cfg!(target_os = "windows") {
        "install the AWS CLI with `winget install Amazon.AWSCLI` or the MSI from https://aws.amazon.com/cli/"
    } else {
        "install the AWS CLI v2 from https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html"
    }
}

async fn read_segments<R>(reader: Option<R>, tx: flume::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };

    let mut buf = [0u8; READ_BUFFER];
    let mut pending = Vec::new();
    loop {
        let read = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) => {
                debug!(error = %e, "uploader output closed");
                break;
            }
        };
        for byte in &buf[..read] {
            match byte {
                b'\n' | b'\r' => flush_segment(&mut pending, &tx),
                other => pending.push(*other),
            }
        }
    }
    flush_segment(&mut pending, &tx);
}

fn flush_segment(pending: &mut Vec<u8>, tx: &flume::Sender<String>) {
    let line = String::from_utf8_lossy(pending).trim().to_string();
    pending.clear();
    if !line.is_empty() {
        let _ = tx.send(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress() {
        assert_eq!(
            parse_progress("Completed 1.0 MiB/2.0 MiB (50%) with 1 file(s) remaining"),
            Some(50)
        );
        assert_eq!(parse_progress("(7%)"), Some(7));
        assert_eq!(parse_progress("(12.5%)"), Some(12));
        assert_eq!(parse_progress("(100%)"), Some(100));
        assert_eq!(parse_progress("(250%)"), None);
        assert_eq!(parse_progress("50%"), None);
        assert_eq!(parse_progress("upload: ./a.txt to s3://ap/inbox/a.txt"), None);
    }

    #[test]
    fn test_store_uri() {
        assert_eq!(
            store_uri("arn:aws:s3:us-east-1:1:accesspoint/amg00000", "inbox/amg00000/a.txt"),
            "s3://arn:aws:s3:us-east-1:1:accesspoint/amg00000/inbox/amg00000/a.txt"
        );
    }

    #[tokio::test]
    async fn test_read_segments_splits_carriage_returns() {
        let (tx, rx) = flume::unbounded();
        let input: &[u8] = b"one (10%)\rtwo (20%)\r\nthree\n\n  \nfour";
        read_segments(Some(input), tx).await;
        let lines: Vec<String> = rx.drain().collect();
        assert_eq!(lines, vec!["one (10%)", "two (20%)", "three", "four"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let cli = CliUploader::new("dropzone-definitely-not-installed");
        let availability = cli.check_availability().await;
        assert!(!availability.available);
        assert!(availability.version.is_none());
        assert!(!availability.install_hint.is_empty());
    }

    #[cfg(unix)]
    mod process {
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        use super::*;
        use crate::credentials::ConnectRequest;
        use crate::upload::progress::{progress_channel, UploadEvent};

        fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn credentials(token: Option<&str>) -> Credentials {
            ConnectRequest {
                access_key_id: "AKIATEST".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: token.map(str::to_string),
                access_point: "arn:aws:s3:eu-west-1:1:accesspoint/amg00000".to_string(),
                sub_folder: "/".to_string(),
                region: Some("eu-west-1".to_string()),
            }
            .validate()
            .unwrap()
        }

        #[tokio::test]
        async fn test_upload_success_reports_progress_and_env() {
            let temp = tempfile::tempdir().unwrap();
            let program = script(
                temp.path(),
                "fake-aws",
                r#"printf 'Completed 1 KiB/4 KiB (25%%)\rCompleted 4 KiB/4 KiB (100%%)\r' 1>&2
echo "args=$1 $2 $4 $5 $6"
echo "env=$AWS_ACCESS_KEY_ID $AWS_REGION ${AWS_SESSION_TOKEN:-none}"
exit 0"#,
            );
            let file = temp.path().join("a.txt");
            std::fs::write(&file, "data").unwrap();

            let cli = CliUploader::new(program.display().to_string());
            let (tx, rx) = progress_channel();
            let reporter = FileReporter::new(&tx, 1, 1, "a.txt");
            cli.upload(&credentials(None), "inbox/amg00000/a.txt", &file, &reporter)
                .await
                .unwrap();
            drop(reporter);
            drop(tx);

            let events: Vec<UploadEvent> = rx.drain().collect();
            let progress: Vec<u8> = events
                .iter()
                .filter_map(|e| match e {
                    UploadEvent::Progress { file_progress, .. } => Some(*file_progress),
                    _ => None,
                })
                .collect();
            assert_eq!(progress, vec![25, 100]);

            let logs: Vec<&str> = events
                .iter()
                .filter_map(|e| match e {
                    UploadEvent::CliLog { message, .. } => Some(message.as_str()),
                    _ => None,
                })
                .collect();
            assert!(logs.contains(
                &"args=s3 cp s3://arn:aws:s3:eu-west-1:1:accesspoint/amg00000/inbox/amg00000/a.txt --region eu-west-1"
            ));
            assert!(logs.contains(&"env=AKIATEST eu-west-1 none"));
        }

        #[tokio::test]
        async fn test_nonzero_exit_is_upload_error() {
            let temp = tempfile::tempdir().unwrap();
            let program = script(temp.path(), "failing-aws", "echo 'access denied' 1>&2\nexit 3");
            let file = temp.path().join("b.txt");
            std::fs::write(&file, "data").unwrap();

            let cli = CliUploader::new(program.display().to_string());
            let (tx, _rx) = progress_channel();
            let reporter = FileReporter::new(&tx, 1, 1, "b.txt");
            let err = cli
                .upload(&credentials(Some("tok")), "inbox/amg00000/b.txt", &file, &reporter)
                .await
                .unwrap_err();

            match err {
                DropzoneError::Upload { file, reason } => {
                    assert_eq!(file, "b.txt");
                    assert!(reason.contains('3'), "{reason}");
                    assert!(reason.contains("access denied"), "{reason}");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_missing_program_is_spawn_error() {
            let cli = CliUploader::new("/nonexistent/dropzone-aws");
            let (tx, _rx) = progress_channel();
            let reporter = FileReporter::new(&tx, 1, 1, "c.txt");
            let err = cli
                .upload(&credentials(None), "k", Path::new("/tmp/c.txt"), &reporter)
                .await
                .unwrap_err();
            assert!(matches!(err, DropzoneError::ProcessSpawn { .. }));
        }

        #[tokio::test]
        async fn test_version_probe() {
            let temp = tempfile::tempdir().unwrap();
            let program = script(
                temp.path(),
                "versioned-aws",
                "echo 'aws-cli/2.15.0 Python/3.11.6 Linux/6.1 exe/x86_64'",
            );
            let availability = CliUploader::new(program.display().to_string())
                .check_availability()
                .await;
            assert!(availability.available);
            assert_eq!(
                availability.version.as_deref(),
                Some("aws-cli/2.15.0 Python/3.11.6 Linux/6.1 exe/x86_64")
            );
        }
    }
}

//! Sequential batch orchestration.

use object_store::ObjectStore;
use tracing::{debug, info, warn};

use super::progress::{FileReporter, ProgressSender};
use super::{BatchSummary, FileOutcome, UploadStrategy, UploadTask};
use crate::credentials::Credentials;
use crate::error::{DropzoneError, Result};
use crate::scope::AccessScope;

/// Everything a batch needs besides the files themselves.
#[derive(Debug, Clone, Copy)]
pub struct UploadContext<'a> {
    pub store: &'a dyn ObjectStore,
    pub scope: &'a AccessScope,
    pub credentials: &'a Credentials,
    pub strategy: &'a UploadStrategy,
}

/// Upload `tasks` into `prefix` one file at a time.
///
/// The prefix is clamped to the scope before any key is built. A failing
/// file emits an error event, is recorded, and the next file starts; only an
/// empty batch fails the call as a whole.
pub async fn upload_batch(
    ctx: UploadContext<'_>,
    prefix: &str,
    tasks: &[UploadTask],
    events: &ProgressSender,
) -> Result<BatchSummary> {
    if tasks.is_empty() {
        return Err(DropzoneError::EmptyBatch);
    }

    let prefix = ctx.scope.clamp(prefix);
    let total_files = tasks.len();
    info!(
        prefix = %prefix,
        files = total_files,
        strategy = ctx.strategy.name(),
        "starting upload batch"
    );

    let mut results = Vec::with_capacity(total_files);
    for (idx, task) in tasks.iter().enumerate() {
        let reporter = FileReporter::new(events, idx + 1, total_files, &task.file_name);
        let key = task.target_key(&prefix);
        debug!(file = %task.file_name, key = %key, bytes = task.size, "uploading file");
        reporter.start();

        match upload_one(&ctx, task, &key, &reporter).await {
            Ok(e_tag) => {
                reporter.complete();
                results.push(FileOutcome::succeeded(&task.file_name, key, e_tag));
            }
            Err(e) => {
                let message = e.to_string();
                warn!(file = %task.file_name, key = %key, error = %message, "file upload failed");
                reporter.error(message.clone());
                results.push(FileOutcome::failed(&task.file_name, message));
            }
        }
    }

    let summary = BatchSummary::from_results(results);
    info!(
        succeeded = summary.success_count,
        failed = summary.error_count,
        "upload batch finished"
    );
    Ok(summary)
}

async fn upload_one(
    ctx: &UploadContext<'_>,
    task: &UploadTask,
    key: &str,
    reporter: &FileReporter<'_>,
) -> Result<Option<String>> {
    match ctx.strategy {
        UploadStrategy::Sdk => {
            let progress = |done: u64, total: u64| reporter.bytes(done, total);
            let outcome = ctx
                .store
                .put_file(key, &task.path, &task.content_type, &progress)
                .await
                .map_err(|e| DropzoneError::Upload {
                    file: task.file_name.clone(),
                    reason: e.to_string(),
                })?;
            Ok(outcome.e_tag)
        }
        UploadStrategy::Cli(cli) => {
            cli.upload(ctx.credentials, key, &task.path, reporter).await?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ConnectRequest;
    use crate::upload::progress::{progress_channel, UploadEvent};
    use object_store::MemoryStore;

    fn credentials() -> Credentials {
        ConnectRequest {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            access_point: "x/amg00000".to_string(),
            sub_folder: "/".to_string(),
            region: None,
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_batch_has_no_side_effects() {
        let store = MemoryStore::new();
        let scope = AccessScope::resolve("x/amg00000", "/").unwrap();
        let creds = credentials();
        let strategy = UploadStrategy::Sdk;
        let ctx = UploadContext {
            store: &store,
            scope: &scope,
            credentials: &creds,
            strategy: &strategy,
        };
        let (tx, rx) = progress_channel();

        let err = upload_batch(ctx, scope.root_prefix(), &[], &tx).await.unwrap_err();
        assert!(matches!(err, DropzoneError::EmptyBatch));
        assert_eq!(store.calls(), 0);
        assert!(rx.is_empty());
    }

    #[tokio::test]
    async fn test_escaping_prefix_is_clamped() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let store = MemoryStore::new();
        let scope = AccessScope::resolve("x/amg00000", "jobs").unwrap();
        let creds = credentials();
        let strategy = UploadStrategy::Sdk;
        let ctx = UploadContext {
            store: &store,
            scope: &scope,
            credentials: &creds,
            strategy: &strategy,
        };
        let (tx, _rx) = progress_channel();

        let tasks = vec![UploadTask::from_path(&path).unwrap()];
        let summary = upload_batch(ctx, "inbox/other/", &tasks, &tx).await.unwrap();
        assert!(summary.success);
        assert_eq!(
            summary.results[0].key.as_deref(),
            Some("inbox/amg00000/jobs/a.txt")
        );
        assert_eq!(store.keys(), vec!["inbox/amg00000/jobs/a.txt"]);
        assert_eq!(
            store.content_type("inbox/amg00000/jobs/a.txt").as_deref(),
            Some("text/plain")
        );
    }

    #[tokio::test]
    async fn test_unreadable_file_is_per_file_error() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.txt");
        std::fs::write(&good, "ok").unwrap();

        let store = MemoryStore::new();
        let scope = AccessScope::resolve("x/amg00000", "/").unwrap();
        let creds = credentials();
        let strategy = UploadStrategy::Sdk;
        let ctx = UploadContext {
            store: &store,
            scope: &scope,
            credentials: &creds,
            strategy: &strategy,
        };
        let (tx, rx) = progress_channel();

        let tasks = vec![
            UploadTask::from_path(temp.path().join("missing.txt")).unwrap(),
            UploadTask::from_path(&good).unwrap(),
        ];
        let summary = upload_batch(ctx, scope.root_prefix(), &tasks, &tx).await.unwrap();
        drop(tx);

        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.success_count, 1);
        assert!(!summary.results[0].success);
        assert!(summary.results[1].success);

        let errors: Vec<_> = rx
            .drain()
            .filter(|e| matches!(e, UploadEvent::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].current_file(), 1);
    }
}

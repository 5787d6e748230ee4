//! Integration tests for folder creation

mod common;

use ::common::error::DropzoneError;
use ::common::folder::FOLDER_CONTENT_TYPE;

#[tokio::test]
async fn test_mkdir_at_root() {
    let store = common::seeded_store();
    let (mut session, _) = common::open_session(&store).await;

    let key = session.create_folder("reports").await.unwrap();
    assert_eq!(key, "inbox/amg00000/reports/");
    assert_eq!(store.get(&key).unwrap().len(), 0);
    assert_eq!(store.content_type(&key).as_deref(), Some(FOLDER_CONTENT_TYPE));

    // the new folder shows up as a folder, not a file
    let listing = session.refresh().await.unwrap();
    assert!(listing.folders.contains(&key));
    assert!(!listing.files.contains(&key));
}

#[tokio::test]
async fn test_mkdir_nested_under_current_prefix() {
    let store = common::seeded_store();
    let (mut session, _) = common::open_session(&store).await;

    session.load_folder("inbox/amg00000/jobs/").await.unwrap();
    let key = session.create_folder("  2025 ").await.unwrap();
    assert_eq!(key, "inbox/amg00000/jobs/2025/");
}

#[tokio::test]
async fn test_mkdir_at_root_typed_without_trailing_slash() {
    let store = common::seeded_store();
    let (mut session, _) = common::open_session(&store).await;
    session.load_folder("inbox/amg00000/jobs/").await.unwrap();

    let prefix = session.navigation().resolve_path("inbox/amg00000");
    assert_eq!(prefix, common::ROOT);
    session.load_folder(&prefix).await.unwrap();

    let key = session.create_folder("drafts").await.unwrap();
    assert_eq!(key, "inbox/amg00000/drafts/");
}

#[tokio::test]
async fn test_mkdir_invalid_names_never_reach_store() {
    let store = common::seeded_store();
    let (session, _) = common::open_session(&store).await;
    let calls = store.calls();

    for name in ["", "a/b", "..", "..\\x"] {
        let err = session.create_folder(name).await.unwrap_err();
        assert!(
            matches!(err, DropzoneError::InvalidFolderName { .. }),
            "{name:?}: {err}"
        );
    }
    assert_eq!(store.calls(), calls);
}

#[tokio::test]
async fn test_mkdir_store_failure() {
    let store = common::seeded_store();
    store.fail_puts_to("inbox/amg00000/locked/");
    let (session, _) = common::open_session(&store).await;

    let err = session.create_folder("locked").await.unwrap_err();
    match err {
        DropzoneError::FolderCreate { key, reason } => {
            assert_eq!(key, "inbox/amg00000/locked/");
            assert!(reason.contains("AccessDenied"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

//! One-level folder listing.

use object_store::{ObjectStore, RawListing};
use serde::Serialize;
use tracing::debug;

use crate::error::{DropzoneError, Result};

/// Immediate children of one prefix, in the order the store returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingResult {
    pub prefix: String,
    /// Sub-folder prefixes, each ending in `/`
    pub folders: Vec<String>,
    /// Object keys; never a folder marker, never the prefix itself
    pub files: Vec<String>,
}

impl ListingResult {
    pub fn from_raw(prefix: &str, raw: RawListing) -> Self {
        let files = raw
            .contents
            .into_iter()
            .map(|entry| entry.key)
            .filter(|key| key != prefix && !key.ends_with('/'))
            .collect();

        Self {
            prefix: prefix.to_string(),
            folders: raw.common_prefixes,
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// List `prefix` one level deep.
///
/// Any store failure becomes [`DropzoneError::Listing`] carrying the
/// transport message; no partial result is returned.
pub async fn list_folder(store: &dyn ObjectStore, prefix: &str) -> Result<ListingResult> {
    let raw = store
        .list_immediate_children(prefix)
        .await
        .map_err(|e| DropzoneError::Listing(e.to_string()))?;

    let listing = ListingResult::from_raw(prefix, raw);
    debug!(prefix, items = listing.len(), "folder listed");
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::{MemoryStore, ObjectEntry};

    fn entry(key: &str) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            size: 0,
        }
    }

    #[test]
    fn test_from_raw_filters_markers() {
        let raw = RawListing {
            common_prefixes: vec!["inbox/a/z/".to_string(), "inbox/a/b/".to_string()],
            contents: vec![
                entry("inbox/a/"),
                entry("inbox/a/zeta.txt"),
                entry("inbox/a/stray/"),
                entry("inbox/a/alpha.txt"),
            ],
        };

        let listing = ListingResult::from_raw("inbox/a/", raw);
        // store order is preserved, not re-sorted
        assert_eq!(listing.folders, vec!["inbox/a/z/", "inbox/a/b/"]);
        assert_eq!(listing.files, vec!["inbox/a/zeta.txt", "inbox/a/alpha.txt"]);
        assert_eq!(listing.len(), 4);
    }

    #[tokio::test]
    async fn test_list_folder_maps_errors() {
        let store = MemoryStore::new();
        store.set_fail_listings(true);

        let err = list_folder(&store, "inbox/a/").await.unwrap_err();
        match err {
            DropzoneError::Listing(message) => assert!(message.contains("InvalidAccessKeyId")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_folder() {
        let store = MemoryStore::new();
        store.insert("inbox/a/", "");
        let listing = list_folder(&store, "inbox/a/").await.unwrap();
        assert!(listing.is_empty());
    }
}

//! In-memory object store with S3-like delimiter listing.
//!
//! Keys are kept in a `BTreeMap`, so listings come back in lexicographic
//! order just like S3. Failures can be injected for tests and dry runs.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::{ObjectEntry, ObjectStore, ProgressFn, PutOutcome, RawListing, DELIMITER};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: String,
}

#[derive(Debug, Default)]
struct MemoryInner {
    objects: BTreeMap<String, StoredObject>,
    failing_keys: HashSet<String>,
    fail_listings: bool,
    calls: usize,
}

/// Ordered in-memory backend.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
    chunk_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryInner::default())),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Read local files in chunks of `chunk_size` bytes, reporting progress per chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Seed an object directly, bypassing failure injection and call counting.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.inner.write().objects.insert(
            key.into(),
            StoredObject {
                body: body.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    /// Make every put to `key` fail with a transport error.
    pub fn fail_puts_to(&self, key: impl Into<String>) {
        self.inner.write().failing_keys.insert(key.into());
    }

    /// Make listings fail (or succeed again).
    pub fn set_fail_listings(&self, fail: bool) {
        self.inner.write().fail_listings = fail;
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.read().objects.get(key).map(|o| o.body.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .objects
            .get(key)
            .map(|o| o.content_type.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().objects.keys().cloned().collect()
    }

    /// Number of list/put calls that reached this store.
    pub fn calls(&self) -> usize {
        self.inner.read().calls
    }

    fn begin_put(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner.calls += 1;
        if inner.failing_keys.contains(key) {
            return Err(StoreError::Transport(format!(
                "AccessDenied: put to '{}' rejected",
                key
            )));
        }
        Ok(())
    }

    fn store(&self, key: &str, body: Bytes, content_type: &str) -> PutOutcome {
        let e_tag = format!("\"{}\"", blake3::hash(&body).to_hex());
        self.inner.write().objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        PutOutcome { e_tag: Some(e_tag) }
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn list_immediate_children(&self, prefix: &str) -> Result<RawListing> {
        let mut inner = self.inner.write();
        inner.calls += 1;
        if inner.fail_listings {
            return Err(StoreError::Transport(
                "InvalidAccessKeyId: the access key id does not exist".to_string(),
            ));
        }

        let mut listing = RawListing::default();
        for (key, object) in inner.objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            match rest.find(DELIMITER) {
                Some(idx) => {
                    let common = format!("{}{}", prefix, &rest[..=idx]);
                    if listing.common_prefixes.last() != Some(&common) {
                        listing.common_prefixes.push(common);
                    }
                }
                None => listing.contents.push(ObjectEntry {
                    key: key.clone(),
                    size: object.body.len() as u64,
                }),
            }
        }

        debug!(
            prefix,
            folders = listing.common_prefixes.len(),
            objects = listing.contents.len(),
            "memory listing"
        );
        Ok(listing)
    }

    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<PutOutcome> {
        self.begin_put(key)?;
        Ok(self.store(key, body, content_type))
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
        progress: ProgressFn<'_>,
    ) -> Result<PutOutcome> {
        self.begin_put(key)?;

        let mut file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let mut body = Vec::with_capacity(total as usize);
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
            progress(body.len() as u64, total);
        }

        Ok(self.store(key, Bytes::from(body), content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("inbox/a/", "");
        store.insert("inbox/a/report.pdf", "pdf");
        store.insert("inbox/a/jobs/", "");
        store.insert("inbox/a/jobs/one.txt", "1");
        store.insert("inbox/a/photos/cat.png", "png");
        store.insert("inbox/b/other.txt", "x");
        store
    }

    #[tokio::test]
    async fn test_list_immediate_children() {
        let store = seeded();
        let listing = store.list_immediate_children("inbox/a/").await.unwrap();

        assert_eq!(
            listing.common_prefixes,
            vec!["inbox/a/jobs/".to_string(), "inbox/a/photos/".to_string()]
        );
        let keys: Vec<_> = listing.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["inbox/a/", "inbox/a/report.pdf"]);
    }

    #[tokio::test]
    async fn test_list_does_not_leak_sibling_prefixes() {
        let store = seeded();
        let listing = store.list_immediate_children("inbox/b/").await.unwrap();
        assert!(listing.common_prefixes.is_empty());
        assert_eq!(listing.contents.len(), 1);
        assert_eq!(listing.contents[0].key, "inbox/b/other.txt");
    }

    #[tokio::test]
    async fn test_put_and_fail_injection() {
        let store = MemoryStore::new();
        store.fail_puts_to("inbox/a/bad.txt");

        let ok = store
            .put_object("inbox/a/good.txt", Bytes::from("ok"), "text/plain")
            .await
            .unwrap();
        let expected = format!("\"{}\"", blake3::hash(b"ok").to_hex());
        assert_eq!(ok.e_tag.as_deref(), Some(expected.as_str()));
        assert_eq!(store.get("inbox/a/good.txt").unwrap(), Bytes::from("ok"));
        assert_eq!(
            store.content_type("inbox/a/good.txt").as_deref(),
            Some("text/plain")
        );

        let err = store
            .put_object("inbox/a/bad.txt", Bytes::from("no"), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_put_file_reports_chunks() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("data.bin");
        std::fs::write(&path, vec![7u8; 10]).unwrap();

        let store = MemoryStore::new().with_chunk_size(4);
        let seen = parking_lot::Mutex::new(Vec::new());
        let progress = |done: u64, total: u64| seen.lock().push((done, total));

        store
            .put_file("inbox/a/data.bin", &path, "application/octet-stream", &progress)
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec![(4, 10), (8, 10), (10, 10)]);
        assert_eq!(store.get("inbox/a/data.bin").unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_failing_listing() {
        let store = seeded();
        store.set_fail_listings(true);
        assert!(store.list_immediate_children("inbox/a/").await.is_err());
        store.set_fail_listings(false);
        assert!(store.list_immediate_children("inbox/a/").await.is_ok());
    }
}

//! The object store seam consumed by the dropzone core.

use std::path::Path;

use bytes::Bytes;

use crate::error::Result;

/// Delimiter used for every listing; folders are a listing convention over it.
pub const DELIMITER: &str = "/";

/// Byte progress callback: `(bytes_transferred, total_bytes)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// One object returned in the `contents` part of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
}

/// Raw, unfiltered delimiter listing as the backend returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    /// Virtual subfolders one level below the prefix, each ending in `/`
    pub common_prefixes: Vec<String>,
    /// Objects directly under the prefix, including any folder marker
    pub contents: Vec<ObjectEntry>,
}

/// Result of a successful put.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOutcome {
    pub e_tag: Option<String>,
}

/// Object storage operations the dropzone needs.
///
/// Keys are plain strings: a key ending in `/` is a folder marker and must be
/// stored as-is.
#[async_trait::async_trait]
pub trait ObjectStore: std::fmt::Debug + Send + Sync {
    /// List immediate children of `prefix` using [`DELIMITER`].
    async fn list_immediate_children(&self, prefix: &str) -> Result<RawListing>;

    /// Put an object with a fully buffered body.
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<PutOutcome>;

    /// Upload a local file, reporting byte progress as it goes.
    ///
    /// The default reads the whole file and reports once on completion.
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
        progress: ProgressFn<'_>,
    ) -> Result<PutOutcome> {
        let body = tokio::fs::read(path).await?;
        let total = body.len() as u64;
        let outcome = self.put_object(key, Bytes::from(body), content_type).await?;
        progress(total, total);
        Ok(outcome)
    }
}

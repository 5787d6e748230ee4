//! S3 backend over `aws-sdk-s3`.
//!
//! The bucket may be a plain bucket name or an access point ARN; the SDK
//! resolves ARNs to the access point endpoint itself.

use std::path::Path;

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::store::{ObjectEntry, ObjectStore, ProgressFn, PutOutcome, RawListing, DELIMITER};

pub const DEFAULT_REGION: &str = "us-east-1";

/// Files larger than this go through multipart upload.
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 8 * 1024 * 1024;

/// S3 rejects parts smaller than this (except the last one).
const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

const CREDENTIALS_PROVIDER: &str = "dropzone";

/// Connection settings for the S3 backend.
#[derive(Clone)]
pub struct S3Config {
    /// Bucket name or access point ARN
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
    /// Region (defaults to "us-east-1")
    pub region: Option<String>,
    /// Custom endpoint (e.g. "http://localhost:9000" for MinIO)
    pub endpoint: Option<String>,
    /// Size above which uploads are split into parts
    pub multipart_threshold: u64,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("multipart_threshold", &self.multipart_threshold)
            .finish()
    }
}

/// Object store client for a single bucket or access point.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    multipart_threshold: u64,
}

impl S3Store {
    pub fn new(config: S3Config) -> Result<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StoreError::InvalidConfig("bucket must not be empty".into()));
        }

        let region = config
            .region
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_REGION)
            .to_string();

        let credentials = Credentials::new(
            config.access_key,
            config.secret_key,
            config.session_token,
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version_latest()
            .region(Region::new(region))
            .credentials_provider(credentials);

        if let Some(endpoint) = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self::from_client(
            Client::from_conf(builder.build()),
            config.bucket,
            config.multipart_threshold,
        ))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client, bucket: impl Into<String>, multipart_threshold: u64) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            multipart_threshold: multipart_threshold.max(1),
        }
    }

    fn part_size(&self) -> u64 {
        self.multipart_threshold.max(MIN_PART_SIZE)
    }

    async fn put_multipart(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
        total: u64,
        progress: ProgressFn<'_>,
    ) -> Result<PutOutcome> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(StoreError::transport)?;
        let upload_id = created
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Multipart {
                key: key.to_string(),
                reason: "missing upload id".to_string(),
            })?;

        debug!(key, upload_id = %upload_id, total, "multipart upload started");

        let result = self
            .upload_parts(key, path, &upload_id, total, progress)
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(
                        key,
                        error = %aws_sdk_s3::error::DisplayErrorContext(abort_err),
                        "failed to abort multipart upload"
                    );
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        key: &str,
        path: &Path,
        upload_id: &str,
        total: u64,
        progress: ProgressFn<'_>,
    ) -> Result<PutOutcome> {
        let part_size = self.part_size() as usize;
        let mut file = tokio::fs::File::open(path).await?;
        let mut parts = Vec::new();
        let mut transferred: u64 = 0;
        let mut part_number: i32 = 1;

        loop {
            let mut buffer = vec![0u8; part_size];
            let mut filled = 0;
            while filled < buffer.len() {
                let read = file.read(&mut buffer[filled..]).await?;
                if read == 0 {
                    break;
                }
                filled += read;
            }
            if filled == 0 {
                break;
            }
            buffer.truncate(filled);

            let output = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(buffer))
                .send()
                .await
                .map_err(StoreError::transport)?;

            parts.push(
                CompletedPart::builder()
                    .set_e_tag(output.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );

            transferred += filled as u64;
            progress(transferred, total);
            part_number += 1;
        }

        if parts.is_empty() {
            return Err(StoreError::Multipart {
                key: key.to_string(),
                reason: "no parts were uploaded".to_string(),
            });
        }

        let completed = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(StoreError::transport)?;

        Ok(PutOutcome {
            e_tag: completed.e_tag().map(str::to_string),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn list_immediate_children(&self, prefix: &str) -> Result<RawListing> {
        let mut listing = RawListing::default();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .delimiter(DELIMITER);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(StoreError::transport)?;

            listing.common_prefixes.extend(
                output
                    .common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(str::to_string)),
            );
            listing
                .contents
                .extend(output.contents().iter().filter_map(|object| {
                    object.key().map(|key| ObjectEntry {
                        key: key.to_string(),
                        size: object.size().unwrap_or(0).max(0) as u64,
                    })
                }));

            if output.is_truncated().unwrap_or(false) {
                continuation_token = output.next_continuation_token().map(str::to_string);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        debug!(
            prefix,
            folders = listing.common_prefixes.len(),
            objects = listing.contents.len(),
            "listed prefix"
        );
        Ok(listing)
    }

    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<PutOutcome> {
        let size = body.len();
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(StoreError::transport)?;

        debug!(key, size, "object stored");
        Ok(PutOutcome {
            e_tag: output.e_tag().map(str::to_string),
        })
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
        progress: ProgressFn<'_>,
    ) -> Result<PutOutcome> {
        let total = tokio::fs::metadata(path).await?.len();

        if total > self.multipart_threshold {
            return self
                .put_multipart(key, path, content_type, total, progress)
                .await;
        }

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?;
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(StoreError::transport)?;

        progress(total, total);
        debug!(key, size = total, "file stored");
        Ok(PutOutcome {
            e_tag: output.e_tag().map(str::to_string),
        })
    }
}

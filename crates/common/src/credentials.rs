//! Session credentials.
//!
//! Credentials live only in memory for the lifetime of a session. Nothing in
//! this crate serializes them, and their `Debug` output hides the secrets.

use std::fmt;

use object_store::{S3Config, DEFAULT_REGION};

use crate::error::{DropzoneError, Result};

/// Everything a user types to connect, before validation.
#[derive(Clone, Default)]
pub struct ConnectRequest {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    /// Access point ARN (or bucket name with a `/<id>` suffix)
    pub access_point: String,
    /// Dropzone sub-folder, or `/` for the access point root
    pub sub_folder: String,
    pub region: Option<String>,
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("access_point", &self.access_point)
            .field("sub_folder", &self.sub_folder)
            .field("region", &self.region)
            .finish()
    }
}

impl ConnectRequest {
    /// Trim every field and reject empty required ones.
    pub fn validate(self) -> Result<Credentials> {
        fn required(value: String, field: &'static str) -> Result<String> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(DropzoneError::MissingCredentials(field));
            }
            Ok(trimmed.to_string())
        }

        fn optional(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Ok(Credentials {
            access_key_id: required(self.access_key_id, "access key id")?,
            secret_access_key: required(self.secret_access_key, "secret access key")?,
            access_point: required(self.access_point, "access point")?,
            sub_folder: required(self.sub_folder, "dropzone folder")?,
            session_token: optional(self.session_token),
            region: optional(self.region).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        })
    }
}

/// Validated connection credentials.
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    access_point: String,
    sub_folder: String,
    region: String,
}

impl Credentials {
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn access_point(&self) -> &str {
        &self.access_point
    }

    pub fn sub_folder(&self) -> &str {
        &self.sub_folder
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// S3 backend settings targeting the access point.
    pub fn s3_config(&self, endpoint: Option<String>, multipart_threshold: u64) -> S3Config {
        S3Config {
            bucket: self.access_point.clone(),
            access_key: self.access_key_id.clone(),
            secret_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
            region: Some(self.region.clone()),
            endpoint,
            multipart_threshold,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("access_point", &self.access_point)
            .field("sub_folder", &self.sub_folder)
            .field("region", &self.region)
            .finish()
    }
}

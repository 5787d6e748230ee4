//! Access scope derived from an access point identifier.
//!
//! Every key the dropzone reads or writes lives under the scope's root
//! prefix: `inbox/<accessPointId>/` or `inbox/<accessPointId>/<subFolder>/`.
//! Anything outside it is clamped back to the root instead of rejected.

use std::fmt;
use std::str::FromStr;

use crate::error::{DropzoneError, Result};

pub const INBOX_PREFIX: &str = "inbox/";

/// Sub-folder value meaning "the access point root".
pub const ROOT_SUB_FOLDER: &str = "/";

const PARENT_SEGMENT: &str = "..";

/// A parsed `<prefix>/<accessPointId>[-<suffix>]` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    raw: String,
    id: String,
    suffix: Option<String>,
}

impl AccessPoint {
    pub fn parse(identifier: &str) -> Result<Self> {
        let raw = identifier.trim();
        let malformed = || DropzoneError::MalformedIdentifier(raw.to_string());

        let (_, remainder) = raw.split_once('/').ok_or_else(malformed)?;
        let name = remainder.split('/').next().unwrap_or_default();
        let (id, suffix) = match name.split_once('-') {
            Some((id, suffix)) => (id, Some(suffix)),
            None => (name, None),
        };

        if id.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            raw: raw.to_string(),
            id: id.to_string(),
            suffix: suffix.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }

    /// The full identifier as given (trimmed); this is what the store is addressed with.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Text after the first `-` in the access point name. Not used for scoping.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

impl FromStr for AccessPoint {
    type Err = DropzoneError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AccessPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The prefix boundary for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessScope {
    access_point: AccessPoint,
    root_prefix: String,
}

impl AccessScope {
    /// Derive the root prefix from an access point identifier and sub-folder.
    pub fn resolve(identifier: &str, sub_folder: &str) -> Result<Self> {
        let access_point = AccessPoint::parse(identifier)?;
        Self::for_access_point(access_point, sub_folder)
    }

    pub fn for_access_point(access_point: AccessPoint, sub_folder: &str) -> Result<Self> {
        let sub_folder = sub_folder.trim();
        if sub_folder.is_empty() {
            return Err(DropzoneError::MissingCredentials("dropzone folder"));
        }

        let mut root_prefix = format!("{}{}/", INBOX_PREFIX, access_point.id());
        if sub_folder != ROOT_SUB_FOLDER {
            let sub_folder = sub_folder.trim_matches('/');
            if sub_folder.split('/').any(|segment| segment == PARENT_SEGMENT) {
                return Err(DropzoneError::InvalidFolderName {
                    name: sub_folder.to_string(),
                    reason: "dropzone folder cannot contain '..'",
                });
            }
            if !sub_folder.is_empty() {
                root_prefix.push_str(sub_folder);
                root_prefix.push('/');
            }
        }

        Ok(Self {
            access_point,
            root_prefix,
        })
    }

    pub fn access_point(&self) -> &AccessPoint {
        &self.access_point
    }

    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    /// Whether `prefix` is the root or lies below it.
    pub fn contains(&self, prefix: &str) -> bool {
        prefix.len() >= self.root_prefix.len()
            && prefix.starts_with(&self.root_prefix)
            && !prefix.split('/').any(|segment| segment == PARENT_SEGMENT)
    }

    /// Normalise `prefix` to end in `/` and clamp it to the root if it escapes.
    pub fn clamp(&self, prefix: &str) -> String {
        let mut normalized = prefix.trim().to_string();
        if !normalized.is_empty() && !normalized.ends_with('/') {
            normalized.push('/');
        }

        if self.contains(&normalized) {
            normalized
        } else {
            self.root_prefix.clone()
        }
    }
}

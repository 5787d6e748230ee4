//! Folder creation through zero-byte marker objects.

use bytes::Bytes;
use object_store::ObjectStore;
use tracing::info;

use crate::error::{DropzoneError, Result};
use crate::scope::AccessScope;

/// Content type written on folder markers.
pub const FOLDER_CONTENT_TYPE: &str = "application/x-directory";

/// Validate a user-supplied folder name and return it trimmed.
pub fn validate_folder_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    let invalid = |reason| DropzoneError::InvalidFolderName {
        name: name.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("folder name cannot be empty"));
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed.contains("..") {
        return Err(invalid(
            "folder name cannot include path separators, backslashes, or \"..\"",
        ));
    }
    Ok(trimmed.to_string())
}

/// Create `<prefix><name>/` as an empty object and return its key.
///
/// The name is validated before the store is touched; `prefix` is clamped to
/// the scope.
pub async fn create_folder(
    store: &dyn ObjectStore,
    scope: &AccessScope,
    prefix: &str,
    name: &str,
) -> Result<String> {
    let name = validate_folder_name(name)?;
    let key = format!("{}{}/", scope.clamp(prefix), name);

    store
        .put_object(&key, Bytes::new(), FOLDER_CONTENT_TYPE)
        .await
        .map_err(|e| DropzoneError::FolderCreate {
            key: key.clone(),
            reason: e.to_string(),
        })?;

    info!(key = %key, "folder created");
    Ok(key)
}

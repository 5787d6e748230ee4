//! Error taxonomy shared by every dropzone operation.

use object_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DropzoneError {
    /// Access point identifier could not be split into prefix and id
    #[error("malformed access point identifier '{0}': expected '<prefix>/<accessPointId>[-<suffix>]'")]
    MalformedIdentifier(String),

    /// A required connection field was empty
    #[error("missing required credential: {0}")]
    MissingCredentials(&'static str),

    /// Listing failed; navigation state was left untouched
    #[error("S3 error: {0}")]
    Listing(String),

    /// One file failed to transfer
    #[error("upload of '{file}' failed: {reason}")]
    Upload { file: String, reason: String },

    /// Folder name rejected before any store call
    #[error("invalid folder name '{name}': {reason}")]
    InvalidFolderName { name: String, reason: &'static str },

    /// External uploader could not be started
    #[error("failed to start uploader '{program}': {reason}")]
    ProcessSpawn { program: String, reason: String },

    /// Store rejected the folder marker
    #[error("failed to create folder '{key}': {reason}")]
    FolderCreate { key: String, reason: String },

    #[error("no files selected for upload")]
    EmptyBatch,

    #[error("object store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, DropzoneError>;

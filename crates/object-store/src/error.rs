//! Error types for the object store collaborator.

/// Errors that can occur when talking to the object store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport, auth or service error reported by the backend
    #[error("{0}")]
    Transport(String),

    /// IO error while reading a local file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Multipart upload could not be completed
    #[error("multipart upload failed for '{key}': {reason}")]
    Multipart { key: String, reason: String },
}

impl StoreError {
    /// Wrap any backend error, keeping its full source chain in the message.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error,
    {
        Self::Transport(aws_sdk_s3::error::DisplayErrorContext(err).to_string())
    }
}

/// Result type alias for object store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

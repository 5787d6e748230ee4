//! Object storage collaborator for the dropzone.
//!
//! This crate is the seam between the dropzone core and the managed object
//! store. It exposes a small [`ObjectStore`] trait (delimiter listing, buffered
//! put, file put with byte progress) and two backends:
//!
//! - [`S3Store`]: AWS S3 through `aws-sdk-s3`. The bucket may be an access
//!   point ARN. Large files use multipart upload with per-part progress.
//! - [`MemoryStore`]: ordered in-memory map with S3 listing semantics and
//!   failure injection, for tests and dry runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use dropzone_object_store::{ObjectStoreConfig, Storage};
//!
//! # async fn example() -> Result<(), dropzone_object_store::StoreError> {
//! let storage = Storage::new(ObjectStoreConfig::Memory)?;
//! let listing = storage.list_immediate_children("inbox/amg00000/").await?;
//! println!("{} folders", listing.common_prefixes.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod s3;
mod storage;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store, DEFAULT_MULTIPART_THRESHOLD, DEFAULT_REGION};
pub use storage::{ObjectStoreConfig, Storage};
pub use store::{ObjectEntry, ObjectStore, ProgressFn, PutOutcome, RawListing, DELIMITER};

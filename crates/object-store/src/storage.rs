//! Object storage backend selection (S3 access point or memory).

use std::ops::Deref;
use std::sync::Arc;

use crate::error::Result;
use crate::memory::MemoryStore;
use crate::s3::{S3Config, S3Store};
use crate::store::ObjectStore;

/// Configuration for the object storage backend.
#[derive(Debug, Clone, Default)]
pub enum ObjectStoreConfig {
    /// In-memory storage (for testing and dry runs)
    #[default]
    Memory,

    /// S3 bucket or access point
    S3(S3Config),
}

/// Shared handle to whichever backend is in use.
#[derive(Debug, Clone)]
pub struct Storage {
    inner: Arc<dyn ObjectStore>,
}

impl Storage {
    /// Create a new storage backend from configuration.
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match config {
            ObjectStoreConfig::Memory => Arc::new(MemoryStore::new()),
            ObjectStoreConfig::S3(config) => Arc::new(S3Store::new(config)?),
        };
        Ok(Self { inner })
    }

    /// Wrap an existing backend, e.g. a seeded [`MemoryStore`].
    pub fn from_store(store: impl ObjectStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl Deref for Storage {
    type Target = dyn ObjectStore;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

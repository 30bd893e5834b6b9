//! Id allocation
//!
//! Ids come from a single counter entry advanced with the backend's
//! add-and-return primitive. The value handed out is the one this call
//! committed; there is no follow-up read that a concurrent allocator could
//! race with.

use std::sync::Arc;
use tracing::{debug, error};

use crate::storage::StorageImpl;
use crate::types::{Error, KvKey, RecordId, Result};

/// Produces unique, strictly increasing record ids
pub struct IdAllocator<B: StorageImpl> {
    backend: Arc<B>,
    counter_key: KvKey,
}

impl<B: StorageImpl> IdAllocator<B> {
    /// Allocator over the default `["counter", "pokemon"]` entry
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_key(backend, KvKey::counter())
    }

    /// Allocator over an arbitrary counter entry
    pub fn with_key(backend: Arc<B>, counter_key: KvKey) -> Self {
        Self { backend, counter_key }
    }

    /// Allocate the next id
    ///
    /// Fails with [`Error::AllocationFailed`] when the increment cannot be
    /// committed; the caller must then abort without writing anything.
    pub fn next_id(&self) -> Result<RecordId> {
        match self.backend.atomic_add(&self.counter_key, 1) {
            Ok(id) => {
                debug!(id, counter = %self.counter_key, "allocated id");
                Ok(id)
            }
            Err(e) => {
                error!(counter = %self.counter_key, error = %e, "id allocation failed");
                Err(Error::AllocationFailed(e))
            }
        }
    }

    /// Last issued id, 0 if none was ever issued
    pub fn current(&self) -> Result<RecordId> {
        let value = self.backend.get(&self.counter_key)?;
        Ok(value.and_then(|v| v.as_u64()).unwrap_or(0))
    }
}

impl<B: StorageImpl> Clone for IdAllocator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            counter_key: self.counter_key.clone(),
        }
    }
}

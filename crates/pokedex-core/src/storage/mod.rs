//! Storage layer for the Pokedex service
//!
//! This module provides the key-value abstraction that lets different
//! backends sit under the same allocator, record store and collection
//! service.

use serde_json::Value;

use crate::types::{KvKey, StoreError};

/// Result type for backend operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Trait for embedded key-value backends
///
/// Every operation touches a single key except `list`. Single-key operations
/// are atomic with respect to each other; there are no multi-key transactions.
pub trait KvBackend: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &KvKey) -> StoreResult<Option<Value>>;

    /// All entries whose key starts with `prefix`, in key order
    fn list(&self, prefix: &KvKey) -> StoreResult<Vec<(KvKey, Value)>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &KvKey, value: Value) -> StoreResult<()>;

    /// Remove `key`; returns whether an entry existed
    fn delete(&self, key: &KvKey) -> StoreResult<bool>;

    /// Add `delta` to the counter at `key` and return the committed result
    ///
    /// A missing entry counts as 0. The returned value is the one produced by
    /// this call's own increment, never one advanced by a concurrent caller.
    fn atomic_add(&self, key: &KvKey, delta: u64) -> StoreResult<u64>;
}

/// In-memory backend (dashmap)
pub mod mem_simple;

/// Journaled disk backend
pub mod journal;

/// Id allocation on top of a backend counter
pub mod allocator;

/// Record get/list/put/delete under the collection prefix
pub mod record_store;

/// Collection service composing allocator and record store
pub mod collection;

/// Re-export main storage types
pub use mem_simple::MemoryBackend;
pub use journal::DiskBackend;
pub use allocator::IdAllocator;
pub use record_store::RecordStore;
pub use collection::{parse_record_id, Collection};

/// Helper trait that combines all requirements for backend implementations
/// This cleans up generic bounds throughout the codebase
pub trait StorageImpl: KvBackend + Send + Sync + 'static {}

/// Blanket implementation for any type that meets the requirements
impl<T> StorageImpl for T where T: KvBackend + Send + Sync + 'static {}

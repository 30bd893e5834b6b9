//! # Pokedex Core
//!
//! Core types and storage for the Pokedex record service: the embedded
//! key-value backends, the id allocator, the record store and the collection
//! service the HTTP layer is built on.

#![warn(missing_docs)]

/// Application configuration, state and factory
pub mod core;

/// Type definitions for keys, records and errors
pub mod types;

/// System constants
pub mod constants;

/// Key-value backends, allocator and record store
pub mod storage;

// Re-export commonly used items
pub use types::{Error, KeyPart, KvKey, Record, RecordId, Result, StoreError};
pub use storage::{Collection, IdAllocator, KvBackend, RecordStore, StorageImpl};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Type definitions for the Pokedex system
///
/// This module contains all type definitions organized by category.

/// Tuple keys of the key-value space
pub mod key;
/// Schema-free record documents
pub mod record;
/// System-wide error types
pub mod error;

/// Identifier of a record inside the collection
pub type RecordId = u64;

// Re-export commonly used types for convenience
pub use key::{KeyPart, KvKey};
pub use record::{format_timestamp, Record};
pub use error::{Error, Result, StoreError};

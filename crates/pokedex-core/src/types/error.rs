//! Error types and handling for the Pokedex service
//!
//! [`StoreError`] covers the key-value backends. [`Error`] is the domain error
//! returned by the collection service; the HTTP layer maps it to a status.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the key-value backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// Journal or data directory I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value or journal entry could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A complete journal line or stored value is unreadable
    #[error("Data corruption detected at line {line}: {reason}")]
    Corruption {
        /// Journal line number (1-based), 0 when not journal related
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// `atomic_add` was applied to a value that is not an unsigned integer
    #[error("Value at {0} is not a counter")]
    NotACounter(String),

    /// `atomic_add` would overflow u64
    #[error("Counter at {0} would overflow")]
    CounterOverflow(String),
}

/// Main error type for the Pokedex service
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed client input (id, body)
    #[error("{0}")]
    Validation(String),

    /// Missing record or empty collection
    #[error("{0}")]
    NotFound(String),

    /// The id counter could not be advanced; nothing was written
    #[error("Id allocation failed: {0}")]
    AllocationFailed(#[source] StoreError),

    /// Storage layer errors
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::NotFound(_))
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

//! Application State Management
//!
//! This module defines the central AppState handed to every request handler.
//! It is generic over the storage backend so the handlers are monomorphized
//! per backend instead of going through a trait object.

use std::sync::Arc;

use crate::core::config::Config;
use crate::storage::{Collection, StorageImpl};

/// Central application state holding all services and components
pub struct AppState<B: StorageImpl> {
    /// The pokemon collection over the configured backend
    pub collection: Arc<Collection<B>>,

    /// Application configuration
    pub config: Config,
}

// Manual Clone implementation for AppState that doesn't require B: Clone
impl<B: StorageImpl> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            config: self.config.clone(),
        }
    }
}

impl<B: StorageImpl> AppState<B> {
    /// Create a new AppState over an opened backend
    pub fn new(backend: Arc<B>, config: Config) -> Self {
        Self {
            collection: Arc::new(Collection::new(backend)),
            config,
        }
    }
}

//! Application Factory
//!
//! Opens the backend selected by the configuration and wraps it in an
//! [`AppState`].

use std::sync::Arc;
use tracing::info;

use crate::core::app_state::AppState;
use crate::core::config::{Config, StorageType};
use crate::storage::{DiskBackend, MemoryBackend};
use crate::types::Result;

/// Enum to hold different AppState configurations
pub enum ConfiguredAppState {
    /// Configuration using the in-memory backend
    Memory {
        /// The application state with MemoryBackend
        app_state: AppState<MemoryBackend>,
        /// The backend instance
        backend: Arc<MemoryBackend>,
    },
    /// Configuration using the journaled disk backend
    Disk {
        /// The application state with DiskBackend
        app_state: AppState<DiskBackend>,
        /// The backend instance, kept for shutdown sync
        backend: Arc<DiskBackend>,
    },
}

impl ConfiguredAppState {
    /// Get the configuration the state was built from
    pub fn config(&self) -> &Config {
        match self {
            ConfiguredAppState::Memory { app_state, .. } => &app_state.config,
            ConfiguredAppState::Disk { app_state, .. } => &app_state.config,
        }
    }

    /// Get the HTTP address from config
    pub fn http_addr(&self) -> std::net::SocketAddr {
        self.config().server.http_addr
    }

    /// Flush durable state; a no-op for the memory backend
    pub fn sync(&self) -> Result<()> {
        match self {
            ConfiguredAppState::Memory { .. } => Ok(()),
            ConfiguredAppState::Disk { backend, .. } => Ok(backend.sync()?),
        }
    }
}

/// Create AppState based on configuration
pub fn create_app_state(config: Config) -> Result<ConfiguredAppState> {
    info!("Creating AppState with storage type: {:?}", config.storage.storage_type);

    match config.storage.storage_type {
        StorageType::Memory => {
            let backend = Arc::new(MemoryBackend::new());
            info!("MemoryBackend initialized");

            let app_state = AppState::new(Arc::clone(&backend), config);
            Ok(ConfiguredAppState::Memory { app_state, backend })
        }
        StorageType::Disk => {
            let backend = Arc::new(DiskBackend::open(
                &config.storage.data_dir,
                config.storage.sync_writes,
            )?);
            info!("DiskBackend initialized at {}", backend.path().display());

            let app_state = AppState::new(Arc::clone(&backend), config);
            Ok(ConfiguredAppState::Disk { app_state, backend })
        }
    }
}

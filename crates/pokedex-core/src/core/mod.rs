//! Core application logic and configuration

/// Application configuration
pub mod config;

/// Application state management
pub mod app_state;

/// Factory pattern for app creation
pub mod factory;

// Re-export commonly used items
pub use config::{load_config_or_default, Config, LoggingConfig, StorageType};
pub use app_state::AppState;
pub use factory::{create_app_state, ConfiguredAppState};

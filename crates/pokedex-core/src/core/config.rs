//! Configuration for the Pokedex service
//!
//! Settings come from an optional TOML file, then `POKEDEX_*` environment
//! overrides, then validation. Every section and field has a default, so a
//! partial file is fine.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use crate::types::{Error, Result};

/// Available storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    /// In-memory backend, lost on exit
    Memory,
    /// Journaled backend under `data_dir`
    Disk,
}

impl FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageType::Memory),
            "disk" => Ok(StorageType::Disk),
            other => Err(Error::config(format!("Unknown storage type: {}", other))),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Directory served for paths outside the API (None disables it)
    pub static_dir: Option<PathBuf>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub storage_type: StorageType,

    /// Data directory path (disk backend)
    pub data_dir: PathBuf,

    /// fsync the journal after every write (disk backend)
    pub sync_writes: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            static_dir: Some(PathBuf::from("./public")),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Disk,
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Config {
    /// Load the file (or defaults), apply environment overrides and validate
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = load_config_or_default(path);
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `POKEDEX_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(addr) = lookup("POKEDEX_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Some(dir) = lookup("POKEDEX_STATIC_DIR") {
            self.server.static_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }

        // Storage overrides
        if let Some(storage_type) = lookup("POKEDEX_STORAGE_TYPE") {
            self.storage.storage_type = storage_type.parse()?;
        }

        if let Some(data_dir) = lookup("POKEDEX_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        // Logging overrides
        if let Some(level) = lookup("POKEDEX_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("POKEDEX_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config(format!("Invalid log level: {}", self.logging.level))),
        }

        match self.logging.format.to_ascii_lowercase().as_str() {
            "compact" | "json" => {}
            _ => return Err(Error::config(format!("Invalid log format: {}", self.logging.format))),
        }

        if self.storage.storage_type == StorageType::Disk && self.storage.data_dir.as_os_str().is_empty() {
            return Err(Error::config("Disk storage needs a data_dir"));
        }

        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &str) -> Result<Config> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;
    toml::from_str(&config_str)
        .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
}

/// Load configuration from file or use defaults
pub fn load_config_or_default(path: Option<&str>) -> Config {
    match path {
        Some(path) => match load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from: {}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}. Using defaults.", path, e);
                Config::default()
            }
        },
        None => {
            info!("No config file specified, using defaults");
            Config::default()
        }
    }
}

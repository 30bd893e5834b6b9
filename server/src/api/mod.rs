//! HTTP API module for the Pokedex server

/// HTTP request handlers
pub mod api_handlers;

/// HTTP server implementation
pub mod api_server;

/// Request body extraction for record forms
pub mod record_form;

// Re-export commonly used items
pub use api_server::{create_router, start_api_server};

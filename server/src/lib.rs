//! # Pokedex Server
//!
//! HTTP server exposing the pokemon collection stored by `pokedex-core`.
//! Handlers, routing and process-level logging live here; storage, ids and
//! configuration live in the core crate.

#![warn(missing_docs)]

/// HTTP API handlers and routing
pub mod api;

/// Tracing subscriber setup
pub mod logging;

pub use pokedex_core as core_lib;

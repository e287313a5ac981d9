//! leserve - HTTP Server
//!
//! *Le Serve* (The Server) - Axum-based HTTP surface for the LeDossier proposal journey

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// API error types
pub mod error;

/// HTTP handlers for the journey pages
pub mod handlers;

/// Server configuration from TOML
pub mod config;

/// API response types for the journey pages
pub mod responses;

/// Server instance management
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use handlers::{create_router, AppState};
pub use server::LeServeServer;

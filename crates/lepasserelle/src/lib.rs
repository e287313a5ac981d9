// lepasserelle - Collaborator Gateway
//
// *La Passerelle* (The Bridge) - HTTP clients for the proposal backend, the area
// directory and the file-upload service

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! HTTP implementations of the `leparcours` collaborator traits.

/// reqwest-backed collaborators
pub mod client;
/// Endpoints and client limits
pub mod config;
/// Gateway setup errors
pub mod errors;

pub use client::{GatewayClient, HttpBackend, HttpUploadService};
pub use config::GatewayConfig;
pub use errors::{GatewayError, Result};

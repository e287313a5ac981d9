// Gateway Configuration
//
// *La Configuration* (The Configuration) - collaborator endpoints and client limits

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::errors::{GatewayError, Result};

/// Default backend proposal API base URL
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001/api";

/// Default file-upload service base URL
pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:3002/api";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default retries for idempotent reads
pub const DEFAULT_READ_RETRIES: u32 = 2;

/// Collaborator endpoints and HTTP client limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Backend proposal API base URL
    pub backend_url: String,

    /// File-upload service base URL
    pub upload_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries for idempotent reads (area lookups, download links).
    /// Status checks and submissions are never retried.
    pub read_retries: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            read_retries: DEFAULT_READ_RETRIES,
        }
    }
}

impl GatewayConfig {
    /// Load from a TOML file
    ///
    /// A missing file yields the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: GatewayConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Apply environment overrides
    ///
    /// Environment variables:
    /// - `LEPASSERELLE_BACKEND_URL` - Backend proposal API base URL
    /// - `LEPASSERELLE_UPLOAD_URL` - File-upload service base URL
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("LEPASSERELLE_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Ok(url) = std::env::var("LEPASSERELLE_UPLOAD_URL") {
            self.upload_url = url;
        }
        self
    }

    /// Defaults with environment overrides applied
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("backend_url", &self.backend_url), ("upload_url", &self.upload_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(GatewayError::config_error(
                    format!("{name} must be an absolute http(s) URL, got {url:?}"),
                    Some(format!("set {name} to e.g. {DEFAULT_BACKEND_URL}")),
                ));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(GatewayError::config_error(
                "request_timeout_secs must be greater than zero",
                None,
            ));
        }

        Ok(())
    }
}

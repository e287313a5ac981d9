//! Server configuration from TOML or environment

use anyhow::Context;
use leparcours::PollConfig;
use lepasserelle::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default host address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port number
pub const DEFAULT_PORT: u16 = 47269;

/// Default number of upload status checks per poll
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 10;

/// Default wait between upload status checks in milliseconds
pub const DEFAULT_POLL_DELAY_MS: u64 = 2000;

/// Server configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Enable request logging
    pub enable_logging: bool,

    /// Log level for tracing
    pub log_level: String,

    /// Upload status checks per poll
    pub poll_max_attempts: u32,

    /// Wait between upload status checks in milliseconds
    pub poll_delay_ms: u64,

    /// Collaborator endpoints
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            enable_logging: true,
            log_level: "info".to_string(),
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            poll_delay_ms: DEFAULT_POLL_DELAY_MS,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load config from environment variables with fallback to defaults
    ///
    /// Environment variables:
    /// - `LESERVE_HOST` - Server host
    /// - `LESERVE_PORT` - Server port
    /// - `LESERVE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
    /// - `LESERVE_POLL_MAX_ATTEMPTS` - Upload status checks per poll
    /// - `LESERVE_POLL_DELAY_MS` - Wait between status checks
    /// - `LEPASSERELLE_BACKEND_URL`, `LEPASSERELLE_UPLOAD_URL` - Collaborator endpoints
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply environment overrides on top of this configuration
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Ok(host) = std::env::var("LESERVE_HOST") {
            self.host = host;
        }

        if let Some(port) = env_parse("LESERVE_PORT") {
            self.port = port;
        }

        if let Ok(log_level) = std::env::var("LESERVE_LOG_LEVEL") {
            self.log_level = log_level;
        }

        if let Some(attempts) = env_parse("LESERVE_POLL_MAX_ATTEMPTS") {
            self.poll_max_attempts = attempts;
        }

        if let Some(delay) = env_parse("LESERVE_POLL_DELAY_MS") {
            self.poll_delay_ms = delay;
        }

        self.gateway = self.gateway.with_env();
        self
    }

    /// Get the socket address for the server
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }

    /// Get the full server URL (e.g., "http://127.0.0.1:47269")
    #[must_use]
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Upload poller settings
    #[must_use]
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.poll_max_attempts,
            delay: Duration::from_millis(self.poll_delay_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be zero".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        if self.poll_max_attempts == 0 {
            return Err("Poll attempts must be greater than zero".to_string());
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {},
            _ => {
                return Err(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.log_level
                ));
            }
        }

        self.gateway.validate().map_err(|e| match e.suggestion() {
            Some(hint) => format!("{} ({})", e, hint),
            None => e.to_string(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

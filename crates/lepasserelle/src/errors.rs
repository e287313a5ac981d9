// Gateway Errors
//
// *La Gestion des Erreurs* (The Error Management) - setup failures of the gateway

use leparcours::TransportError;
use thiserror::Error;

/// Result type for gateway setup
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Longest response body kept in a [`TransportError::Status`].
pub const MAX_ERROR_BODY_LEN: usize = 512;

/// Gateway setup errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
        /// How to fix it
        suggestion: Option<String>,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl GatewayError {
    /// Create a config error
    pub fn config_error(message: impl Into<String>, suggestion: Option<String>) -> Self {
        GatewayError::Config {
            message: message.into(),
            suggestion,
        }
    }

    /// Suggestion for fixing the error, if any
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            GatewayError::Config { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        GatewayError::ConfigFile(format!("{err:#}"))
    }
}

/// Map a reqwest failure onto the collaborator transport error.
pub(crate) fn transport(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

/// Keep at most [`MAX_ERROR_BODY_LEN`] bytes of a body, on a char boundary.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

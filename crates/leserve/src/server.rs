//! Server instance management

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::handlers::{create_router, AppState};
use lepasserelle::{GatewayClient, HttpBackend, HttpUploadService};

/// LeServe HTTP server
///
/// Manages Axum server lifecycle including startup and graceful shutdown.
pub struct LeServeServer {
    /// Server configuration
    config: ServerConfig,

    /// Handler state with the HTTP collaborators wired in
    state: AppState,
}

impl LeServeServer {
    /// Create new server instance backed by the HTTP gateway
    pub fn new(config: ServerConfig) -> Result<Self, ApiError> {
        if let Err(e) = config.validate() {
            return Err(ApiError::internal(format!("Invalid config: {}", e)));
        }

        let client = GatewayClient::new(config.gateway.clone()).map_err(|e| {
            error!("Failed to build gateway client: {}", e);
            ApiError::internal(format!("Failed to build gateway client: {}", e))
        })?;
        let backend = Arc::new(HttpBackend::new(client.clone()));
        let uploads = Arc::new(HttpUploadService::new(client));

        let state = AppState::new(config.clone(), backend.clone(), backend, uploads);
        Ok(Self { config, state })
    }

    /// Create a server around prepared state (custom collaborators or clock)
    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, ApiError> {
        self.config
            .socket_addr()
            .map_err(|e| ApiError::internal(format!("Failed to parse address: {}", e)))
    }

    /// Router with state and, if enabled, request tracing
    pub fn router(&self) -> axum::Router {
        let app = create_router().with_state(self.state.clone());
        if self.config.enable_logging {
            app.layer(TraceLayer::new_for_http())
        } else {
            app
        }
    }

    /// Start server and run until Ctrl+C or SIGTERM
    pub async fn start(&self) -> Result<(), ApiError> {
        let addr = self.socket_addr()?;
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| {
                error!("Failed to bind to {}: {:?}", addr, e);
                ApiError::internal(format!("Failed to bind to {}: {}", addr, e))
            })?;

        info!("Server listening on: {}", self.server_url());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::internal(format!("Server error: {}", e)))
    }

    /// Get server URL
    #[must_use]
    pub fn server_url(&self) -> String {
        self.config.server_url()
    }
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix;
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received TERM signal");
            }
            Err(e) => {
                error!("Failed to install TERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

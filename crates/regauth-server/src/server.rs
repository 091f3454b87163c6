//! Token server implementation.

use crate::error::ServerError;
use crate::routes;
use crate::state::AppState;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// The registry token server.
pub struct TokenServer {
    state: AppState,
}

impl TokenServer {
    /// Create a new server around the given application state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), ServerError> {
        let addr = self.listen_addr().to_string();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::StartupFailed(format!("{addr}: {e}")))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::StartupFailed(e.to_string()))?;
        tracing::info!(
            address = %local_addr,
            token_path = %self.state.config().server.token_path,
            "Starting regauth token server"
        );

        let app = routes::create_router(self.state.clone());

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::StartupFailed(e.to_string()))?;

        tracing::info!("Token server stopped");
        Ok(())
    }

    /// Get the configured listen address.
    pub fn listen_addr(&self) -> &str {
        &self.state.config().server.listen_addr
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

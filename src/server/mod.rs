// HTTP transport adapter
//
// Exposes every registry entry as POST /{namespace}/{name} plus a generated
// OpenAPI document at /openapi.json.

mod handlers;
mod openapi;

pub use handlers::create_router;
pub use openapi::openapi_doc;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::registry::RegistryHandle;

/// Shared state for the HTTP handlers.
pub struct AppState {
    pub registry: RegistryHandle,
    pub server_name: String,
    pub server_version: String,
}

/// HTTP server over the shared tool registry.
pub struct HttpServer {
    state: Arc<AppState>,
    bind_address: String,
}

impl HttpServer {
    pub fn new(registry: RegistryHandle, name: impl Into<String>, bind_address: String) -> Self {
        Self {
            state: Arc::new(AppState {
                registry,
                server_name: name.into(),
                server_version: env!("CARGO_PKG_VERSION").to_string(),
            }),
            bind_address,
        }
    }

    /// Start the HTTP server; runs until ctrl-c.
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self.bind_address.parse()?;

        let app = create_router(self.state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        tracing::info!(%addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received");
    }
}

pub mod error;
pub mod response;
pub mod routes;

use crate::core::ChatOrchestrator;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router as AxumRouter};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use error::ApiError;
pub use response::*;

const API_PATH: &str = "/api";

/// Web API adapter for HTTP access to the chat core
pub struct WebApiAdapter {
    orchestrator: Arc<ChatOrchestrator>,
    host: String,
    port: u16,
}

impl WebApiAdapter {
    pub fn new(orchestrator: Arc<ChatOrchestrator>, host: String, port: u16) -> Self {
        Self {
            orchestrator,
            host,
            port,
        }
    }

    /// Build Axum router with all endpoints
    pub fn build_routes(&self) -> AxumRouter {
        let api = API_PATH;

        AxumRouter::new()
            .route("/", get(routes::root))
            .route("/health", get(health_handler))
            .route(&format!("{}/chat", api), post(routes::chat))
            .route(&format!("{}/tools", api), get(routes::list_tools))
            .route(&format!("{}/tools/execute", api), post(routes::execute_tool))
            .route(&format!("{}/router", api), get(routes::router_status))
            .route(&format!("{}/router/reset", api), post(routes::router_reset))
            .with_state(self.orchestrator.clone())
            .layer(DefaultBodyLimit::max(1024 * 1024))
            .layer(CorsLayer::permissive())
            .layer(axum::middleware::from_fn(logging_middleware))
    }

    /// Start the Web API server
    pub async fn start(&self) -> Result<()> {
        let app = self.build_routes();
        let addr = format!("{}:{}", self.host, self.port);

        info!(
            "Starting Web API on {} (Health: /health, API: {})",
            addr, API_PATH
        );

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind server to {}", addr))?;

        axum::serve(listener, app).await.context("Server error")?;

        Ok(())
    }
}

/// Health check handler
async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            timestamp: chrono::Utc::now(),
        }),
    )
}

/// Logging middleware
async fn logging_middleware(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();
    tracing::info!("{} {} -> {}", method, uri, status);

    response
}

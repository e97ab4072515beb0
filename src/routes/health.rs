use axum::{extract::State, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(health_detailed))
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub server_config: ServerConfigInfo,
    pub rate_limiting: RateLimitingInfo,
    pub open_sessions: u64,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ServerConfigInfo {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RateLimitingInfo {
    pub enabled: bool,
    pub requests_per_window: u32,
    pub window_seconds: u64,
    pub tracked_clients: usize,
}

/// Basic health check endpoint
///
/// Returns a simple health status indicating the service is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    info!("Basic health check requested");

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Detailed health check endpoint
///
/// Adds the server settings, the live rate limiter settings and the number
/// of open sessions.
#[utoipa::path(
    get,
    path = "/health/detailed",
    tag = "health",
    responses(
        (status = 200, description = "Detailed health information", body = DetailedHealthResponse)
    )
)]
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    info!("Detailed health check requested");

    let server = &state.config.server;
    let limits = state.limiter.settings();

    Json(DetailedHealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        server_config: ServerConfigInfo {
            host: server.host.clone(),
            port: server.port,
            timeout_seconds: server.timeout_seconds,
        },
        rate_limiting: RateLimitingInfo {
            enabled: limits.enabled,
            requests_per_window: limits.requests_per_window,
            window_seconds: limits.window_seconds,
            tracked_clients: state.limiter.tracked_clients(),
        },
        open_sessions: state.sessions.open_sessions(),
    })
}

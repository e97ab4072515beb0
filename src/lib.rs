use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

pub mod config;
pub mod docs;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod store;
pub mod validation;

use config::{AppConfig, CorsConfig};
use middleware::rate_limit::FixedWindowLimiter;
use store::{ItemStore, SessionTracker};

/// Record stores of the route families that keep state.
pub struct Stores {
    pub update_items: ItemStore<Value>,
    pub response_items: ItemStore<Value>,
    pub error_items: ItemStore<String>,
    pub encoded_items: ItemStore<Value>,
}

impl Stores {
    pub fn seeded() -> Self {
        Self {
            update_items: routes::body_updates::seed_items(),
            response_items: routes::response_model::seed_items(),
            error_items: routes::errors::seed_items(),
            encoded_items: ItemStore::new(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub sessions: Arc<SessionTracker>,
    pub stores: Arc<Stores>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let limiter = FixedWindowLimiter::new(config.middleware.rate_limiting.clone());
        Self {
            config: Arc::new(config),
            limiter: Arc::new(limiter),
            sessions: Arc::new(SessionTracker::new()),
            stores: Arc::new(Stores::seeded()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .merge(routes::first_steps::router())
        .nest("/path-params", routes::path_params::router())
        .nest("/path-validation", routes::path_validation::router())
        .nest("/query-params", routes::query_params::router())
        .nest("/query-validation", routes::query_validation::router())
        .nest("/body", routes::body::router())
        .nest("/body-multiple", routes::body_multiple::router())
        .nest("/body-nested", routes::body_nested::router())
        .nest("/body-examples", routes::body_examples::router())
        .nest("/body-updates", routes::body_updates::router())
        .nest("/extra-types", routes::extra_types::router())
        .nest("/extra-models", routes::extra_models::router())
        .nest("/response-model", routes::response_model::router())
        .nest("/status-codes", routes::status_codes::router())
        .nest("/path-ops", routes::path_ops::router())
        .nest("/forms", routes::forms::router())
        .nest("/files", routes::files::router())
        .nest("/form-files", routes::form_files::router())
        .nest("/errors", routes::errors::router())
        .nest("/headers", routes::headers::router())
        .nest("/encoder", routes::encoder::router())
        .nest("/dependencies", routes::dependencies::router())
        .nest("/security", routes::security::router())
        .nest("/cors", routes::cors::router())
        .nest_service(
            "/middleware",
            routes::middleware_demo::service(state.limiter.clone()),
        )
        .merge(routes::health::router())
        .route("/metrics", get(metrics_handler))
        .merge(docs::create_swagger_router(&config.security))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.middleware.cors))
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.timeout_seconds,
                )))
                .layer(from_fn(metrics::track_requests)),
        )
        .with_state(state)
}

/// Serves `app` with peer addresses available to the rate limiter.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

/// Origins from the config; methods and headers mirror the request, which
/// stays valid with credentials.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let allow_origin = if config.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.allow_credentials)
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

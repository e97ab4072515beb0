use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_showcase::{
    config::{watcher::ConfigWatcher, AppConfig, DEFAULT_CONFIG_PATH},
    create_app,
    metrics::install_recorder,
    middleware::rate_limit::FixedWindowLimiter,
    serve, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let initial_config = AppConfig::load_from(&config_path)?;
    info!("Initial configuration loaded successfully");

    let mut state = AppState::new(initial_config.clone());
    if initial_config.metrics.enabled {
        state = state.with_metrics(install_recorder()?);
        info!("Prometheus recorder installed");
    }

    // Only an existing file can be watched
    let _config_watcher = if Path::new(&config_path).exists() {
        let watcher = ConfigWatcher::new(&config_path)?;
        spawn_reload_task(&watcher, state.limiter.clone());
        info!("Hot-reloading enabled for configuration file: {}", watcher.config_path());
        Some(watcher)
    } else {
        warn!("Configuration file {} not found, using defaults and environment", config_path);
        None
    };

    spawn_purge_task(state.limiter.clone());

    let app = create_app(state);

    let addr = format!("{}:{}", initial_config.server.host, initial_config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("API showcase starting on {}", addr);
    info!("Docs available at http://{}/docs", addr);
    if initial_config.metrics.enabled {
        info!("Metrics available at http://{}/metrics", addr);
    }

    serve(listener, app).await?;

    Ok(())
}

/// Re-applies rate limit settings whenever the config file changes.
fn spawn_reload_task(watcher: &ConfigWatcher, limiter: Arc<FixedWindowLimiter>) {
    let mut reload_rx = watcher.subscribe_to_reloads();
    tokio::spawn(async move {
        while let Ok(new_config) = reload_rx.recv().await {
            limiter.reconfigure(new_config.middleware.rate_limiting);
            info!("Configuration reloaded: rate limiting settings applied");
        }
    });
}

/// Drops elapsed windows once per window.
fn spawn_purge_task(limiter: Arc<FixedWindowLimiter>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(limiter.purge_interval()).await;
            let purged = limiter.purge_expired(Instant::now());
            if purged > 0 {
                info!(purged, remaining = limiter.tracked_clients(), "Purged expired rate limit windows");
            }
        }
    });
}

fn init_tracing() -> Result<()> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::registry();

    match log_format.as_str() {
        "json" => {
            subscriber
                .with(tracing_subscriber::fmt::layer().json())
                .with(tracing_subscriber::EnvFilter::from_default_env())
                .init();
        }
        _ => {
            subscriber
                .with(tracing_subscriber::fmt::layer())
                .with(tracing_subscriber::EnvFilter::from_default_env())
                .init();
        }
    }

    Ok(())
}

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod watcher;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub middleware: MiddlewareConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    pub cors: CorsConfig,
    pub rate_limiting: RateLimitingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_origins: vec![
                "http://localhost.tiangolo.com".to_string(),
                "https://localhost.tiangolo.com".to_string(),
                "http://localhost".to_string(),
                "http://localhost:8080".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

/// Fixed-window limits applied per client address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    pub enabled: bool,
    pub requests_per_window: u32,
    pub window_seconds: u64,
}

impl RateLimitingConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: 3,
            window_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub token_url: String,
    pub expected_token: String,
    pub expected_key: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            token_url: "token".to_string(),
            expected_token: "fake-super-secret-token".to_string(),
            expected_key: "fake-super-secret-key".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads from the given file, which may be absent, plus the environment.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SHOWCASE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        // Override with environment variables if present
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>()?)?;
        }

        let settings = builder.build()?;
        let config: AppConfig = settings.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_middleware_example() {
        let config = AppConfig::default();
        assert_eq!(config.middleware.rate_limiting.requests_per_window, 3);
        assert_eq!(config.middleware.rate_limiting.window(), Duration::from_secs(60));
        assert_eq!(config.middleware.cors.allow_origins.len(), 4);
        assert_eq!(config.security.token_url, "token");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from("does/not/exist.yaml").unwrap();
        assert_eq!(config.middleware.rate_limiting, RateLimitingConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = std::env::temp_dir().join(format!("showcase-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "middleware:\n  rate_limiting:\n    requests_per_window: 10\n",
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.middleware.rate_limiting.requests_per_window, 10);
        assert_eq!(config.middleware.rate_limiting.window_seconds, 60);
        assert!(config.middleware.cors.enabled);

        std::fs::remove_file(path).unwrap();
    }
}

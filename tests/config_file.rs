use api_showcase::config::{AppConfig, DEFAULT_CONFIG_PATH};

#[test]
fn test_shipped_config_matches_defaults() {
    let raw = std::fs::read_to_string(DEFAULT_CONFIG_PATH).unwrap();
    let parsed: AppConfig = serde_yaml::from_str(&raw).unwrap();
    let defaults = AppConfig::default();

    assert_eq!(parsed.middleware.rate_limiting, defaults.middleware.rate_limiting);
    assert_eq!(parsed.middleware.cors.allow_origins, defaults.middleware.cors.allow_origins);
    assert_eq!(parsed.server.port, defaults.server.port);
    assert_eq!(parsed.security.token_url, defaults.security.token_url);
    assert_eq!(parsed.security.expected_token, defaults.security.expected_token);
}

#[test]
fn test_shipped_config_loads_through_config_layer() {
    let config = AppConfig::load_from(DEFAULT_CONFIG_PATH).unwrap();
    assert!(config.middleware.rate_limiting.enabled);
    assert_eq!(config.middleware.rate_limiting.requests_per_window, 3);
}

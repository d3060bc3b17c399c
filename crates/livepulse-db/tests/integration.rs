//! Offline unit tests for livepulse-db pool configuration.
//! These tests do not require a live database connection.

use livepulse_core::{AppConfig, Environment};
use livepulse_db::PoolConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        monitor_base_url: "http://127.0.0.1:5000".to_string(),
        monitor_api_key: None,
        monitor_timeout_secs: 15,
        gemini_api_key: None,
        gemini_model: "gemini-2.5-flash".to_string(),
        gemini_timeout_secs: 60,
        gemini_max_retries: 2,
        gemini_retry_backoff_base_ms: 1000,
        analytics_read_timeout_secs: 30,
        recorder_enabled: false,
        recorder_interval_secs: 5,
        recorder_max_concurrent: 4,
        api_keys: Vec::new(),
        rate_limit_max_requests: 120,
        rate_limit_window_secs: 60,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

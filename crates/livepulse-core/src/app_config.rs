use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub monitor_base_url: String,
    pub monitor_api_key: Option<String>,
    pub monitor_timeout_secs: u64,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_timeout_secs: u64,
    pub gemini_max_retries: u32,
    pub gemini_retry_backoff_base_ms: u64,
    pub analytics_read_timeout_secs: u64,
    pub recorder_enabled: bool,
    pub recorder_interval_secs: u32,
    pub recorder_max_concurrent: usize,
    /// Bearer tokens accepted by the HTTP API. Empty disables auth in development.
    pub api_keys: Vec<String>,
    /// Requests admitted per rate-limit window across all protected routes.
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("monitor_base_url", &self.monitor_base_url)
            .field(
                "monitor_api_key",
                &self.monitor_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("monitor_timeout_secs", &self.monitor_timeout_secs)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_timeout_secs", &self.gemini_timeout_secs)
            .field("gemini_max_retries", &self.gemini_max_retries)
            .field(
                "gemini_retry_backoff_base_ms",
                &self.gemini_retry_backoff_base_ms,
            )
            .field(
                "analytics_read_timeout_secs",
                &self.analytics_read_timeout_secs,
            )
            .field("recorder_enabled", &self.recorder_enabled)
            .field("recorder_interval_secs", &self.recorder_interval_secs)
            .field("recorder_max_concurrent", &self.recorder_max_concurrent)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .finish()
    }
}

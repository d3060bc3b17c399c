use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the real environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("LIVEPULSE_ENV", "development"));

    let bind_addr = or_default("LIVEPULSE_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("LIVEPULSE_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("LIVEPULSE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("LIVEPULSE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("LIVEPULSE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("LIVEPULSE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let monitor_base_url = or_default("LIVEPULSE_MONITOR_BASE_URL", "http://127.0.0.1:5000");
    let monitor_api_key = optional("LIVEPULSE_MONITOR_API_KEY");
    let monitor_timeout_secs = parse_u64("LIVEPULSE_MONITOR_TIMEOUT_SECS", "15")?;

    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("LIVEPULSE_GEMINI_MODEL", "gemini-2.5-flash");
    let gemini_timeout_secs = parse_u64("LIVEPULSE_GEMINI_TIMEOUT_SECS", "60")?;
    let gemini_max_retries = parse_u32("LIVEPULSE_GEMINI_MAX_RETRIES", "2")?;
    let gemini_retry_backoff_base_ms = parse_u64("LIVEPULSE_GEMINI_RETRY_BACKOFF_BASE_MS", "1000")?;

    let analytics_read_timeout_secs = parse_u64("LIVEPULSE_ANALYTICS_READ_TIMEOUT_SECS", "30")?;

    let recorder_enabled = parse_bool(&or_default("LIVEPULSE_RECORDER_ENABLED", "false"))
        .ok_or_else(|| invalid("LIVEPULSE_RECORDER_ENABLED", "expected true or false".into()))?;
    let recorder_interval_secs = parse_u32("LIVEPULSE_RECORDER_INTERVAL_SECS", "5")?;
    if !(1..=59).contains(&recorder_interval_secs) {
        return Err(invalid(
            "LIVEPULSE_RECORDER_INTERVAL_SECS",
            format!("must be between 1 and 59, got {recorder_interval_secs}"),
        ));
    }
    let recorder_max_concurrent = parse_usize("LIVEPULSE_RECORDER_MAX_CONCURRENT", "4")?;
    if recorder_max_concurrent == 0 {
        return Err(invalid(
            "LIVEPULSE_RECORDER_MAX_CONCURRENT",
            "must be at least 1".to_string(),
        ));
    }

    let api_keys = parse_key_list(&or_default("LIVEPULSE_API_KEYS", ""));
    let rate_limit_max_requests = parse_u32("LIVEPULSE_RATE_LIMIT_MAX_REQUESTS", "120")?;
    if rate_limit_max_requests == 0 {
        return Err(invalid(
            "LIVEPULSE_RATE_LIMIT_MAX_REQUESTS",
            "must be at least 1".to_string(),
        ));
    }
    let rate_limit_window_secs = parse_u64("LIVEPULSE_RATE_LIMIT_WINDOW_SECS", "60")?;
    if rate_limit_window_secs == 0 {
        return Err(invalid(
            "LIVEPULSE_RATE_LIMIT_WINDOW_SECS",
            "must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        monitor_base_url,
        monitor_api_key,
        monitor_timeout_secs,
        gemini_api_key,
        gemini_model,
        gemini_timeout_secs,
        gemini_max_retries,
        gemini_retry_backoff_base_ms,
        analytics_read_timeout_secs,
        recorder_enabled,
        recorder_interval_secs,
        recorder_max_concurrent,
        api_keys,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Split a comma-separated key list, dropping blanks and duplicates.
fn parse_key_list(raw: &str) -> Vec<String> {
    let mut keys: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

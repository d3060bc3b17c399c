//! Shared domain records and configuration for LivePulse.
//!
//! Everything here is plain data: the session/metric records consumed by the
//! analytics engine, the wire payloads exchanged with the live-monitor
//! service, and the environment-driven [`AppConfig`].

pub mod app_config;
pub mod config;
pub mod live;
pub mod sessions;
pub mod username;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use live::{
    ActiveMonitor, ActiveMonitorsResponse, LiveCurrentMetrics, LiveMetricsSnapshot,
    LiveRawMetrics, StartMonitoringResponse, StopMonitoringResponse,
};
pub use sessions::{MetricSample, Session, SessionScope};
pub use username::normalize_username;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("username is required")]
    EmptyUsername,

    #[error("invalid username: {0}")]
    InvalidUsername(String),
}

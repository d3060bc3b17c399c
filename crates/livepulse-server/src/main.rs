mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use livepulse_core::AppConfig;
use livepulse_gemini::GeminiClient;
use livepulse_monitor::MonitorClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(livepulse_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = livepulse_db::PoolConfig::from_app_config(&config);
    let pool = livepulse_db::connect_pool(&config.database_url, pool_config).await?;
    livepulse_db::run_migrations(&pool).await?;

    let monitor = MonitorClient::new(
        &config.monitor_base_url,
        config.monitor_api_key.as_deref(),
        config.monitor_timeout_secs,
    )?;
    let narrator = build_narrator(&config)?;

    let _scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&config), monitor.clone()).await?;

    let auth = AuthState::from_config(&config)?;
    let state = AppState::new(
        pool,
        monitor,
        narrator,
        Duration::from_secs(config.analytics_read_timeout_secs),
    );
    let app = build_app(state, auth, RateLimitState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, env = %config.env, "livepulse server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// `None` when no Gemini key is configured.
fn build_narrator(config: &AppConfig) -> anyhow::Result<Option<GeminiClient>> {
    let Some(api_key) = config.gemini_api_key.as_deref() else {
        tracing::warn!("GEMINI_API_KEY not set; narrative endpoint disabled");
        return Ok(None);
    };

    let client = GeminiClient::new(api_key, &config.gemini_model, config.gemini_timeout_secs)?
        .with_retry(config.gemini_max_retries, config.gemini_retry_backoff_base_ms);
    tracing::info!(model = client.model(), "narrative generation enabled");
    Ok(Some(client))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

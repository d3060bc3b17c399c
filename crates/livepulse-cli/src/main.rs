mod report;

use std::time::Duration;

use clap::{Parser, Subcommand};
use livepulse_analytics::{AccountSort, AnalyticsEngine, SortOrder};
use livepulse_core::AppConfig;
use livepulse_db::PgSessionReader;
use livepulse_gemini::GeminiClient;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "livepulse-cli")]
#[command(about = "LivePulse command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the global summary and one row per account
    Summary {
        /// Emit the summary as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Sort accounts by username, sessions, avg_score, best_score, worst_score or last_session
        #[arg(long)]
        sort: Option<AccountSort>,
        /// Sort ascending (default is descending)
        #[arg(long, requires = "sort")]
        asc: bool,
    },
    /// Print per-session series for one account
    Account {
        /// Account handle, with or without a leading @
        username: String,
        /// Emit the series as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Generate a natural-language performance report for one account
    Narrative {
        /// Account handle, with or without a leading @
        username: String,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("livepulse-cli: run with --help to list commands");
        return Ok(());
    };

    let config = livepulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // Logs go to stderr so `--json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?command, "livepulse-cli starting");

    let pool_config = livepulse_db::PoolConfig::from_app_config(&config);
    let pool = livepulse_db::connect_pool(&config.database_url, pool_config).await?;

    if matches!(command, Commands::Migrate) {
        let applied = livepulse_db::run_migrations(&pool).await?;
        println!("migrations applied ({applied} total)");
        return Ok(());
    }

    let engine = AnalyticsEngine::new(PgSessionReader::new(pool))
        .with_read_timeout(Duration::from_secs(config.analytics_read_timeout_secs));

    match command {
        Commands::Summary { json, sort, asc } => {
            let order = if asc { SortOrder::Asc } else { SortOrder::Desc };
            report::run_summary(&engine, sort.map(|field| (field, order)), json).await
        }
        Commands::Account { username, json } => {
            let username = livepulse_core::normalize_username(&username)?;
            report::run_account(&engine, &username, json).await
        }
        Commands::Narrative { username } => {
            let username = livepulse_core::normalize_username(&username)?;
            let narrator = build_narrator(&config)?;
            report::run_narrative(&engine, &narrator, &username).await
        }
        Commands::Migrate => Ok(()),
    }
}

fn build_narrator(config: &AppConfig) -> anyhow::Result<GeminiClient> {
    let api_key = config
        .gemini_api_key
        .as_deref()
        .ok_or_else(|| {
            anyhow::anyhow!("GEMINI_API_KEY is not set; narrative generation is disabled")
        })?;
    Ok(
        GeminiClient::new(api_key, &config.gemini_model, config.gemini_timeout_secs)?
            .with_retry(config.gemini_max_retries, config.gemini_retry_backoff_base_ms),
    )
}

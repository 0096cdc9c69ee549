use anyhow::Context;
use tokio::net::TcpListener;

use quantlogix::app;
use quantlogix::config::{AppConfig, DataSourceConfig};
use quantlogix::logging::{self, LoggingConfig};
use quantlogix::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env().context("invalid configuration")?;

    match &config.data_source {
        DataSourceConfig::Synthetic(s) => tracing::info!(
            "📊 Using synthetic data (seed {}, {} days, initial value {:.2})",
            s.seed,
            s.num_days,
            s.initial_value
        ),
        DataSourceConfig::Alpaca(b) => tracing::info!("📊 Using Alpaca brokerage at {}", b.base_url),
    }

    let state = AppState::from_config(&config).context("failed to create brokerage client")?;
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 QuantLogix dashboard running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

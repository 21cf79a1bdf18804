use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alisaver::bot::AppState;
use alisaver::config::Config;
use alisaver::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,alisaver=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Webhook base: {}", config.webhook.base_url);
    info!("  Tracking id: {}", config.affiliate.tracking_id);
    info!(
        "  Currency: {} -> {}",
        config.affiliate.currency, config.exchange.target_currency
    );

    let bot = Bot::new(&config.telegram.bot_token);
    let state = Arc::new(AppState::new(config)?);

    info!("Bot is starting...");
    server::run(bot, state).await
}

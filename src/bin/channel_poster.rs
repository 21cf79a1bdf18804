//! Hot-products channel poster.
//!
//! A standalone companion process to the chat bot: on a fixed interval it
//! picks a random keyword category, samples a handful of products from the
//! affiliate hot-product search, and posts each to the configured broadcast
//! channel with price, rating, and a promotion link. Per-product failures
//! are logged and skipped; the loop never terminates on error.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Recipient};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use alisaver::affiliate::{AffiliateClient, Product};
use alisaver::compose;
use alisaver::config::{Config, PosterConfig};
use alisaver::rates::RateClient;
use alisaver::scheduler::Scheduler;

struct PosterContext {
    bot: Bot,
    affiliate: AffiliateClient,
    rates: RateClient,
    poster: PosterConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,alisaver=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let poster = config
        .poster
        .clone()
        .context("[poster] section is required for the channel poster")?;

    let bot = Bot::new(&config.telegram.bot_token);
    let affiliate = AffiliateClient::new(&config.affiliate)?;
    let rates = RateClient::new(&config.exchange)?;
    let interval = Duration::from_secs(poster.interval_minutes * 60);
    let channel = poster.channel.clone();

    let context = Arc::new(PosterContext {
        bot,
        affiliate,
        rates,
        poster,
    });

    let scheduler = Scheduler::new().await?;
    let job_context = Arc::clone(&context);
    scheduler
        .add_repeated_job(interval, "hot-products", move || {
            let context = Arc::clone(&job_context);
            Box::pin(async move {
                post_cycle(&context).await;
            })
        })
        .await?;
    scheduler.start().await?;

    info!(
        "Channel poster started: posting to {} every {} minutes",
        channel, context.poster.interval_minutes
    );
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("Channel poster shutting down");
    Ok(())
}

/// One wake-up: keyword → hot-product search → bounded random sample →
/// post each, skipping failures.
async fn post_cycle(context: &PosterContext) {
    let Some(keyword) = pick_keyword(&context.poster.keywords) else {
        warn!("No keywords configured, skipping cycle");
        return;
    };

    info!("Sampling hot products for keyword: {}", keyword);
    let products = match context
        .affiliate
        .hot_products(&keyword, context.poster.page_size)
        .await
    {
        Ok(products) => products,
        Err(e) => {
            error!("Hot product search failed: {:#}", e);
            return;
        }
    };
    if products.is_empty() {
        warn!("No products found for keyword: {}", keyword);
        return;
    }

    for product in sample_products(&products, context.poster.products_per_cycle) {
        if let Err(e) = post_product(context, &product).await {
            error!("Failed to post product: {:#}", e);
        }
    }
}

// rand's thread-local generator is not Send; sampling stays in sync scopes
// so the job future can cross await points.
fn pick_keyword(keywords: &[String]) -> Option<String> {
    let mut rng = rand::thread_rng();
    keywords.choose(&mut rng).cloned()
}

fn sample_products(products: &[Product], count: usize) -> Vec<Product> {
    let mut rng = rand::thread_rng();
    products.choose_multiple(&mut rng, count).cloned().collect()
}

async fn post_product(context: &PosterContext, product: &Product) -> Result<()> {
    let (Some(title), Some(detail_url)) = (
        product.product_title.as_deref(),
        product.product_detail_url.as_deref(),
    ) else {
        bail!("product is missing a title or detail URL");
    };

    info!("Posting product: {}", title);

    // Conversion failure falls back to the raw product URL.
    let link = match context.affiliate.promotion_link(detail_url).await {
        Ok(promo) => promo,
        Err(e) => {
            warn!("Affiliate link failed, using raw product URL: {:#}", e);
            detail_url.to_string()
        }
    };

    let price_usd = product.sale_price_usd();
    let rate = if price_usd.is_some() {
        match context.rates.usd_rate().await {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!("Exchange rate fetch failed: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let caption = compose::channel_caption(
        title,
        price_usd,
        rate,
        product.evaluate_rate.as_deref(),
        &link,
        &context.poster.channel,
    );

    let recipient = channel_recipient(&context.poster.channel);
    match product
        .product_main_image_url
        .as_deref()
        .and_then(|u| Url::parse(u).ok())
    {
        Some(image) => {
            context
                .bot
                .send_photo(recipient, InputFile::url(image))
                .caption(caption)
                .await?;
        }
        None => {
            context.bot.send_message(recipient, caption).await?;
        }
    }
    Ok(())
}

fn channel_recipient(channel: &str) -> Recipient {
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(channel.to_string()),
    }
}

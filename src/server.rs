//! Webhook plumbing: teloxide's axum update listener merged with the
//! health-check and webhook re-registration routes, served on one socket.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use url::Url;

use crate::bot::{self, AppState};

#[derive(Clone)]
struct WebhookState {
    bot: Bot,
    url: Url,
}

/// Registers the webhook, serves the HTTP surface, and runs the dispatcher
/// until the update listener stops.
pub async fn run(bot: Bot, state: Arc<AppState>) -> Result<()> {
    let addr = state.config.webhook.bind_addr;
    let url: Url = format!(
        "{}/webhook",
        state.config.webhook.base_url.trim_end_matches('/')
    )
    .parse()
    .context("invalid webhook base_url")?;

    let options = webhooks::Options::new(addr, url.clone());
    let (listener, stop_flag, webhook_router) = webhooks::axum_to_router(bot.clone(), options)
        .await
        .context("failed to register webhook")?;

    let app = Router::new()
        .route("/", get(health))
        .route("/setwebhook", get(reregister_webhook))
        .with_state(WebhookState {
            bot: bot.clone(),
            url: url.clone(),
        })
        .merge(webhook_router);

    let tcp = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Webhook server listening on {} for {}", addr, url);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app)
            .with_graceful_shutdown(stop_flag)
            .await
        {
            error!("Webhook server error: {}", e);
        }
    });

    let mut dispatcher = Dispatcher::builder(bot, bot::handler_tree())
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .build();
    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("webhook listener"),
        )
        .await;

    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

/// `GET /setwebhook` — drops and re-registers the webhook, mirroring the
/// registration done at startup.
async fn reregister_webhook(State(state): State<WebhookState>) -> (StatusCode, String) {
    if let Err(e) = state.bot.delete_webhook().await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("error removing webhook: {e}"),
        );
    }
    match state.bot.set_webhook(state.url.clone()).await {
        Ok(_) => (StatusCode::OK, format!("webhook set to {}", state.url)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("error setting webhook: {e}"),
        ),
    }
}

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub webhook: WebhookConfig,
    pub affiliate: AffiliateConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Only the channel-poster binary needs this section.
    #[serde(default)]
    pub poster: Option<PosterConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// Public base URL Telegram can reach; `/webhook` is appended.
    pub base_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AffiliateConfig {
    pub app_key: String,
    pub app_secret: String,
    #[serde(default = "default_tracking_id")]
    pub tracking_id: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    #[serde(default = "default_exchange_base_url")]
    pub base_url: String,
    #[serde(default = "default_target_currency")]
    pub target_currency: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_exchange_base_url(),
            target_currency: default_target_currency(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PosterConfig {
    /// `@username` or numeric chat id of the broadcast channel.
    pub channel: String,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_products_per_cycle")]
    pub products_per_cycle: usize,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default bind address")
}

fn default_tracking_id() -> String {
    "telegramBot".to_string()
}

fn default_language() -> String {
    "AR".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_exchange_base_url() -> String {
    "https://api.exchangerate-api.com/v4/latest".to_string()
}

fn default_target_currency() -> String {
    "MAD".to_string()
}

fn default_interval_minutes() -> u64 {
    30
}

fn default_page_size() -> u32 {
    20
}

fn default_products_per_cycle() -> usize {
    3
}

fn default_keywords() -> Vec<String> {
    ["electronics", "fashion", "home", "beauty"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

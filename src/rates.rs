use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::ExchangeConfig;

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Client for the public exchange-rate API. One GET per lookup, no caching;
/// callers treat failure as "display USD only".
pub struct RateClient {
    client: reqwest::Client,
    base_url: String,
    target_currency: String,
}

impl RateClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build exchange-rate client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            target_currency: config.target_currency.clone(),
        })
    }

    /// USD → target-currency rate, fetched fresh.
    pub async fn usd_rate(&self) -> Result<f64> {
        let url = format!("{}/USD", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("exchange rate request failed")?
            .error_for_status()
            .context("exchange rate request rejected")?;
        let body: RatesResponse = response
            .json()
            .await
            .context("exchange rate response was not valid JSON")?;
        body.rates
            .get(&self.target_currency)
            .copied()
            .with_context(|| format!("no {} rate in response", self.target_currency))
    }
}

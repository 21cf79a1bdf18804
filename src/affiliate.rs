//! Signed client for the AliExpress affiliate open-platform gateway.
//!
//! Every call is a GET against the `/sync` endpoint with the API method name
//! as a parameter; requests are authenticated by an HMAC-SHA256 signature
//! over the sorted parameter set. Responses arrive in per-method JSON
//! envelopes with an `error_response` variant for gateway-level rejections.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::debug;

use crate::config::AffiliateConfig;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_BASE_URL: &str = "https://api-sg.aliexpress.com/sync";

const LINK_GENERATE: &str = "aliexpress.affiliate.link.generate";
const PRODUCT_DETAIL: &str = "aliexpress.affiliate.productdetail.get";
const HOT_PRODUCTS: &str = "aliexpress.affiliate.hotproduct.query";

const DETAIL_FIELDS: &str = "target_sale_price,product_title,product_main_image_url";

/// A product as the affiliate API reports it. Everything is optional in the
/// wire shape; prices arrive as decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub product_id: Option<u64>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub target_sale_price: Option<String>,
    #[serde(default)]
    pub product_main_image_url: Option<String>,
    #[serde(default)]
    pub product_detail_url: Option<String>,
    #[serde(default)]
    pub evaluate_rate: Option<String>,
}

impl Product {
    /// Sale price parsed as USD, when present and numeric.
    pub fn sale_price_usd(&self) -> Option<f64> {
        self.target_sale_price.as_deref()?.trim().parse().ok()
    }
}

// ── Wire envelopes ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RespEnvelope<T> {
    resp_result: RespResult<T>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct RespResult<T> {
    #[serde(default)]
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LinkGenerateResponse {
    #[serde(rename = "aliexpress_affiliate_link_generate_response")]
    response: RespEnvelope<LinkGenerateResult>,
}

#[derive(Debug, Deserialize)]
struct LinkGenerateResult {
    promotion_links: PromotionLinks,
}

#[derive(Debug, Deserialize)]
struct PromotionLinks {
    #[serde(default)]
    promotion_link: Vec<PromotionLink>,
}

#[derive(Debug, Deserialize)]
struct PromotionLink {
    promotion_link: String,
}

#[derive(Debug, Deserialize)]
struct ProductDetailResponse {
    #[serde(rename = "aliexpress_affiliate_productdetail_get_response")]
    response: RespEnvelope<ProductListResult>,
}

#[derive(Debug, Deserialize)]
struct HotProductsResponse {
    #[serde(rename = "aliexpress_affiliate_hotproduct_query_response")]
    response: RespEnvelope<ProductListResult>,
}

#[derive(Debug, Deserialize)]
struct ProductListResult {
    #[serde(default)]
    products: ProductArray,
}

#[derive(Debug, Default, Deserialize)]
struct ProductArray {
    #[serde(default)]
    product: Vec<Product>,
}

// ── Client ─────────────────────────────────────────────────────────────────

pub struct AffiliateClient {
    client: reqwest::Client,
    base_url: String,
    app_key: String,
    app_secret: String,
    tracking_id: String,
    language: String,
    currency: String,
}

impl AffiliateClient {
    pub fn new(config: &AffiliateConfig) -> Result<Self> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Client with a custom gateway URL (for testing with wiremock).
    pub fn with_base_url(config: &AffiliateConfig, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build affiliate API client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
            tracking_id: config.tracking_id.clone(),
            language: config.language.clone(),
            currency: config.currency.clone(),
        })
    }

    /// Converts a target URL into a trackable promotion link.
    pub async fn promotion_link(&self, target_url: &str) -> Result<String> {
        let body = self
            .execute(
                LINK_GENERATE,
                [
                    ("promotion_link_type", "0".to_string()),
                    ("source_values", target_url.to_string()),
                    ("tracking_id", self.tracking_id.clone()),
                ],
            )
            .await?;
        let envelope: LinkGenerateResponse =
            serde_json::from_value(body).context("unexpected link.generate response shape")?;
        envelope
            .response
            .resp_result
            .result
            .and_then(|r| r.promotion_links.promotion_link.into_iter().next())
            .map(|l| l.promotion_link)
            .context("no promotion link in response")
    }

    /// Title / price / image for one product id.
    pub async fn product_detail(&self, product_id: &str) -> Result<Product> {
        let body = self
            .execute(
                PRODUCT_DETAIL,
                [
                    ("product_ids", product_id.to_string()),
                    ("fields", DETAIL_FIELDS.to_string()),
                    ("target_currency", self.currency.clone()),
                    ("target_language", self.language.clone()),
                    ("tracking_id", self.tracking_id.clone()),
                ],
            )
            .await?;
        let envelope: ProductDetailResponse =
            serde_json::from_value(body).context("unexpected productdetail response shape")?;
        envelope
            .response
            .resp_result
            .result
            .and_then(|r| r.products.product.into_iter().next())
            .with_context(|| format!("product {product_id} not found"))
    }

    /// Hot-product search for a keyword.
    pub async fn hot_products(&self, keywords: &str, page_size: u32) -> Result<Vec<Product>> {
        let body = self
            .execute(
                HOT_PRODUCTS,
                [
                    ("keywords", keywords.to_string()),
                    ("page_size", page_size.to_string()),
                    ("target_currency", self.currency.clone()),
                    ("target_language", self.language.clone()),
                    ("tracking_id", self.tracking_id.clone()),
                ],
            )
            .await?;
        let envelope: HotProductsResponse =
            serde_json::from_value(body).context("unexpected hotproduct response shape")?;
        Ok(envelope
            .response
            .resp_result
            .result
            .map(|r| r.products.product)
            .unwrap_or_default())
    }

    async fn execute<const N: usize>(
        &self,
        method: &str,
        extra: [(&str, String); N],
    ) -> Result<Value> {
        let mut params = self.base_params(method);
        for (key, value) in extra {
            params.insert(key.to_string(), value);
        }
        let sign = self.sign(&params)?;
        params.insert("sign".to_string(), sign);

        debug!("Calling affiliate API: {}", method);
        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("{method} returned HTTP {status}: {error_body}");
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("{method} response was not valid JSON"))?;
        Self::check_api_error(method, &body)?;
        Ok(body)
    }

    fn base_params(&self, method: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("app_key".to_string(), self.app_key.clone());
        params.insert("method".to_string(), method.to_string());
        params.insert("sign_method".to_string(), "sha256".to_string());
        params.insert(
            "timestamp".to_string(),
            Utc::now().timestamp_millis().to_string(),
        );
        params
    }

    /// HMAC-SHA256 over the parameters concatenated as `key1value1key2…` in
    /// key order, hex-encoded uppercase.
    fn sign(&self, params: &BTreeMap<String, String>) -> Result<String> {
        let mut payload = String::new();
        for (key, value) in params {
            payload.push_str(key);
            payload.push_str(value);
        }
        let mut mac = HmacSha256::new_from_slice(self.app_secret.as_bytes())
            .map_err(|e| anyhow!("invalid app secret: {e}"))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode_upper(mac.finalize().into_bytes()))
    }

    fn check_api_error(method: &str, body: &Value) -> Result<()> {
        if let Some(error) = body.get("error_response") {
            let code = error
                .get("code")
                .map(ToString::to_string)
                .unwrap_or_default();
            let msg = error
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            bail!("{method} rejected by gateway: code {code}: {msg}");
        }
        Ok(())
    }
}

//! The deal pipeline: resolved link → product id → affiliate link set →
//! optional detail and exchange rate → composed reply.
//!
//! Every remote call after id extraction degrades instead of failing; the
//! missing product id is the only terminal error.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::affiliate::AffiliateClient;
use crate::compose::{self, PricedProduct};
use crate::extract;
use crate::rates::RateClient;
use crate::resolve::LinkResolver;

/// Shopping-cart page whose cart-discount link the callback button requests.
pub const CART_INDEX_URL: &str = "https://www.aliexpress.com/p/shoppingcart/index.html?";

/// Promotion links per campaign variant. Each is independently fallible;
/// an absent variant degrades the caption, never the reply.
#[derive(Debug, Clone, Default)]
pub struct AffiliateLinks {
    pub coin: Option<String>,
    pub bundle: Option<String>,
    pub super_deal: Option<String>,
    pub limited: Option<String>,
}

#[derive(Debug, Error)]
pub enum DealError {
    #[error("no product identifier in {link}")]
    NoProductId { link: String },
}

#[derive(Debug)]
pub struct DealReply {
    pub caption: String,
    pub photo: Option<Url>,
}

pub fn coin_target(product_id: &str) -> String {
    format!(
        "https://m.aliexpress.com/p/coin-index/index.html\
         ?_immersiveMode=true&from=syicon&productIds={product_id}"
    )
}

pub fn bundle_target(link: &str) -> String {
    format!(
        "https://star.aliexpress.com/share/share.htm\
         ?platform=AE&businessType=ProductDetail&redirectUrl={link}?sourceType=560&aff_fcid="
    )
}

pub fn super_target(link: &str) -> String {
    format!(
        "https://star.aliexpress.com/share/share.htm\
         ?platform=AE&businessType=ProductDetail&redirectUrl={link}&sourceType=562&aff_fcid="
    )
}

pub fn limited_target(link: &str) -> String {
    format!(
        "https://star.aliexpress.com/share/share.htm\
         ?platform=AE&businessType=ProductDetail&redirectUrl={link}&sourceType=561&aff_fcid="
    )
}

/// Rebuilds the trade-confirm URL for a cart link: the cart's
/// `availableProductShopcartIds` joined with `,` plus the compact
/// channel-info JSON, both percent-encoded.
pub fn shopcart_target(link: &str) -> String {
    let ids: Vec<String> = Url::parse(link)
        .map(|url| {
            url.query_pairs()
                .filter(|(key, _)| key == "availableProductShopcartIds")
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default();
    let extra_params = r#"{"channelInfo":{"sourceType":"620"}}"#;
    format!(
        "https://www.aliexpress.com/p/trade/confirm.html\
         ?availableProductShopcartIds={}&extraParams={}",
        utf8_percent_encode(&ids.join(","), NON_ALPHANUMERIC),
        utf8_percent_encode(extra_params, NON_ALPHANUMERIC)
    )
}

/// Requests all four campaign variants; each failure leaves that variant
/// absent without aborting the others.
pub async fn generate_links(
    affiliate: &AffiliateClient,
    product_id: &str,
    resolved_link: &str,
) -> AffiliateLinks {
    AffiliateLinks {
        coin: convert(affiliate, "coin", &coin_target(product_id)).await,
        bundle: convert(affiliate, "bundle", &bundle_target(resolved_link)).await,
        super_deal: convert(affiliate, "super", &super_target(resolved_link)).await,
        limited: convert(affiliate, "limited", &limited_target(resolved_link)).await,
    }
}

async fn convert(affiliate: &AffiliateClient, variant: &str, target: &str) -> Option<String> {
    match affiliate.promotion_link(target).await {
        Ok(link) => Some(link),
        Err(e) => {
            warn!("Generating {} link failed: {:#}", variant, e);
            None
        }
    }
}

/// Runs the whole pipeline for an extracted link.
pub async fn build_reply(
    affiliate: &AffiliateClient,
    rates: &RateClient,
    resolver: &LinkResolver,
    link: &str,
) -> Result<DealReply, DealError> {
    let resolved = resolver.resolve(link).await;
    let product_id = extract::product_id(&resolved)
        .ok_or_else(|| DealError::NoProductId {
            link: resolved.clone(),
        })?
        .to_string();

    let links = generate_links(affiliate, &product_id, &resolved).await;

    let detail = match affiliate.product_detail(&product_id).await {
        Ok(product) => Some(product),
        Err(e) => {
            warn!("Product detail fetch failed for {}: {:#}", product_id, e);
            None
        }
    };

    // A detail without a usable price degrades to the link-only reply.
    let priced = detail
        .as_ref()
        .and_then(|p| p.sale_price_usd().map(|usd| (p, usd)));

    let (summary, photo) = match priced {
        Some((product, price_usd)) => {
            let rate = match rates.usd_rate().await {
                Ok(rate) => Some(rate),
                Err(e) => {
                    warn!("Exchange rate fetch failed: {:#}", e);
                    None
                }
            };
            let summary = PricedProduct {
                title: product.product_title.clone().unwrap_or_default(),
                price_usd,
                price_local: rate.map(|r| price_usd * r),
            };
            let photo = product
                .product_main_image_url
                .as_deref()
                .and_then(|u| Url::parse(u).ok());
            (Some(summary), photo)
        }
        None => (None, None),
    };

    Ok(DealReply {
        caption: compose::deal_caption(summary.as_ref(), &links),
        photo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_target_carries_product_id() {
        let target = coin_target("1234567890123");
        assert!(target.starts_with("https://m.aliexpress.com/p/coin-index/index.html"));
        assert!(target.contains("productIds=1234567890123"));
        assert!(target.contains("from=syicon"));
    }

    #[test]
    fn share_targets_differ_only_in_source_type() {
        let link = "https://www.aliexpress.com/item/1.html";
        assert!(bundle_target(link).contains("?sourceType=560&aff_fcid="));
        assert!(super_target(link).contains("&sourceType=562&aff_fcid="));
        assert!(limited_target(link).contains("&sourceType=561&aff_fcid="));
        for target in [bundle_target(link), super_target(link), limited_target(link)] {
            assert!(target.contains("redirectUrl=https://www.aliexpress.com/item/1.html"));
        }
    }

    #[test]
    fn shopcart_target_joins_ids_and_encodes_extra_params() {
        let link = "https://www.aliexpress.com/p/shoppingcart/index.html\
                    ?availableProductShopcartIds=111&availableProductShopcartIds=222";
        let target = shopcart_target(link);
        assert!(target.contains("availableProductShopcartIds=111%2C222"));
        assert!(target.contains("sourceType"));
        // Compact JSON survives percent-encoding (no raw braces or quotes).
        assert!(!target.contains('{'));
        assert!(!target.contains('"'));
    }

    #[test]
    fn shopcart_target_tolerates_missing_ids() {
        let target = shopcart_target(CART_INDEX_URL);
        assert!(target.contains("availableProductShopcartIds=&extraParams="));
    }
}

//! Integration tests for the HTTP clients using wiremock mocks.

use alisaver::affiliate::AffiliateClient;
use alisaver::config::{AffiliateConfig, ExchangeConfig};
use alisaver::rates::RateClient;
use alisaver::resolve::LinkResolver;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn affiliate_client(base_url: &str) -> AffiliateClient {
    let config = AffiliateConfig {
        app_key: "508800".to_string(),
        app_secret: "test-secret".to_string(),
        tracking_id: "telegramBot".to_string(),
        language: "AR".to_string(),
        currency: "USD".to_string(),
    };
    AffiliateClient::with_base_url(&config, base_url).expect("client construction should not fail")
}

#[tokio::test]
async fn promotion_link_parses_envelope() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "aliexpress_affiliate_link_generate_response": {
            "resp_result": {
                "resp_code": 200,
                "result": {
                    "promotion_links": {
                        "promotion_link": [
                            {
                                "promotion_link": "https://s.click.aliexpress.com/e/_Dabc123",
                                "source_value": "https://www.aliexpress.com/item/1.html"
                            }
                        ]
                    },
                    "total_result_count": 1
                }
            }
        }
    });

    Mock::given(method("GET"))
        .and(query_param("method", "aliexpress.affiliate.link.generate"))
        .and(query_param("app_key", "508800"))
        .and(query_param("tracking_id", "telegramBot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = affiliate_client(&server.uri());
    let link = client
        .promotion_link("https://www.aliexpress.com/item/1.html")
        .await
        .expect("should parse promotion link");
    assert_eq!(link, "https://s.click.aliexpress.com/e/_Dabc123");
}

#[tokio::test]
async fn gateway_error_response_fails_the_call() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "error_response": { "code": 25, "msg": "Invalid signature" }
    });

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = affiliate_client(&server.uri());
    let err = client
        .promotion_link("https://www.aliexpress.com/item/1.html")
        .await
        .expect_err("gateway rejection must surface as an error");
    assert!(err.to_string().contains("Invalid signature"));
}

#[tokio::test]
async fn empty_link_list_is_an_error() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "aliexpress_affiliate_link_generate_response": {
            "resp_result": {
                "resp_code": 405,
                "result": { "promotion_links": { "promotion_link": [] } }
            }
        }
    });

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = affiliate_client(&server.uri());
    assert!(client
        .promotion_link("https://www.aliexpress.com/item/1.html")
        .await
        .is_err());
}

#[tokio::test]
async fn product_detail_returns_first_product() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "aliexpress_affiliate_productdetail_get_response": {
            "resp_result": {
                "resp_code": 200,
                "result": {
                    "current_record_count": 1,
                    "products": {
                        "product": [
                            {
                                "product_id": 1234567890123u64,
                                "product_title": "سماعات بلوتوث",
                                "target_sale_price": "12.99",
                                "product_main_image_url": "https://ae01.alicdn.com/kf/x.jpg"
                            }
                        ]
                    }
                }
            }
        }
    });

    Mock::given(method("GET"))
        .and(query_param("method", "aliexpress.affiliate.productdetail.get"))
        .and(query_param("product_ids", "1234567890123"))
        .and(query_param("target_currency", "USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = affiliate_client(&server.uri());
    let product = client
        .product_detail("1234567890123")
        .await
        .expect("should parse product detail");
    assert_eq!(product.product_title.as_deref(), Some("سماعات بلوتوث"));
    assert_eq!(product.sale_price_usd(), Some(12.99));
    assert_eq!(
        product.product_main_image_url.as_deref(),
        Some("https://ae01.alicdn.com/kf/x.jpg")
    );
}

#[tokio::test]
async fn hot_products_parses_list() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "aliexpress_affiliate_hotproduct_query_response": {
            "resp_result": {
                "resp_code": 200,
                "result": {
                    "total_record_count": 2,
                    "products": {
                        "product": [
                            {
                                "product_id": 1u64,
                                "product_title": "a",
                                "target_sale_price": "1.00",
                                "product_detail_url": "https://www.aliexpress.com/item/1.html",
                                "evaluate_rate": "97.1%"
                            },
                            {
                                "product_id": 2u64,
                                "product_title": "b",
                                "target_sale_price": "2.00"
                            }
                        ]
                    }
                }
            }
        }
    });

    Mock::given(method("GET"))
        .and(query_param("method", "aliexpress.affiliate.hotproduct.query"))
        .and(query_param("keywords", "electronics"))
        .and(query_param("page_size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = affiliate_client(&server.uri());
    let products = client
        .hot_products("electronics", 20)
        .await
        .expect("should parse hot products");
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].evaluate_rate.as_deref(), Some("97.1%"));
}

#[tokio::test]
async fn usd_rate_picks_target_currency() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "base": "USD",
        "rates": { "MAD": 10.03, "EUR": 0.91 }
    });

    Mock::given(method("GET"))
        .and(path("/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let config = ExchangeConfig {
        base_url: server.uri(),
        target_currency: "MAD".to_string(),
    };
    let client = RateClient::new(&config).expect("client construction should not fail");
    let rate = client.usd_rate().await.expect("should parse rate");
    assert!((rate - 10.03).abs() < f64::EPSILON);
}

#[tokio::test]
async fn missing_target_currency_is_an_error() {
    let server = MockServer::start().await;

    let body = serde_json::json!({ "rates": { "EUR": 0.91 } });
    Mock::given(method("GET"))
        .and(path("/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let config = ExchangeConfig {
        base_url: server.uri(),
        target_currency: "MAD".to_string(),
    };
    let client = RateClient::new(&config).expect("client construction should not fail");
    assert!(client.usd_rate().await.is_err());
}

#[tokio::test]
async fn resolver_follows_redirect_chain() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/item/123.html", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/123.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("product page"))
        .mount(&server)
        .await;

    let resolver = LinkResolver::new().expect("resolver construction should not fail");
    let resolved = resolver.resolve(&format!("{}/short", server.uri())).await;
    assert_eq!(resolved, format!("{}/item/123.html", server.uri()));
}

#[tokio::test]
async fn resolver_returns_input_on_network_failure() {
    // Nothing listens on port 9; the original link must come back unchanged.
    let resolver = LinkResolver::new().expect("resolver construction should not fail");
    let link = "http://127.0.0.1:9/item/123.html";
    assert_eq!(resolver.resolve(link).await, link);
}

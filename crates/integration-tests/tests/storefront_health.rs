//! Integration tests for health checks, request IDs, and cache maintenance.

use lather_integration_tests::TestContext;
use reqwest::StatusCode;
use url::Url;

#[tokio::test]
async fn test_health_and_readiness() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .send()
        .await
        .expect("Failed to call /health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(resp.text().await.expect("body"), "ok");

    let resp = ctx
        .client
        .get(ctx.url("/health/ready"))
        .send()
        .await
        .expect("Failed to call /health/ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .header("x-request-id", "req-lavender-42")
        .send()
        .await
        .expect("Failed to call /health");
    assert_eq!(
        resp.headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-lavender-42")
    );
}

#[tokio::test]
async fn test_unreachable_backend_degrades_gracefully() {
    let ctx = TestContext::start_with(|config| {
        config.commerce.backend_url = Url::parse("http://127.0.0.1:9").expect("valid URL");
    })
    .await;

    let resp = ctx
        .client
        .get(ctx.url("/health/ready"))
        .send()
        .await
        .expect("Failed to call /health/ready");
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Listing still renders, just empty
    let resp = ctx
        .client
        .get(ctx.url("/us/store?sort_by=price_asc"))
        .send()
        .await
        .expect("Failed to get store page");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.expect("store JSON");
    assert_eq!(body["count"], 0);
    assert_eq!(body["next_page"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_region_cache_and_clear() {
    let ctx = TestContext::start().await;

    for path in ["/us/cart", "/ca/cart", "/de/cart", "/us/cart"] {
        let resp = ctx
            .client
            .get(ctx.url(path))
            .send()
            .await
            .expect("Failed to get cart");
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(ctx.backend.region_requests(), 1);

    let resp = ctx
        .client
        .delete(ctx.url("/api/cache"))
        .send()
        .await
        .expect("Failed to clear cache");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    ctx.client
        .get(ctx.url("/us/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(ctx.backend.region_requests(), 2);
}

#[tokio::test]
async fn test_new_region_visible_after_miss() {
    let ctx = TestContext::start().await;

    let body: serde_json::Value = ctx
        .client
        .get(ctx.url("/gb/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("cart JSON");
    // No region serves gb yet, so the us fallback's currency is used
    assert_eq!(body["currency_code"], "usd");

    ctx.backend
        .add_region(serde_json::json!({
            "id": "reg_uk",
            "name": "United Kingdom",
            "currency_code": "gbp",
            "countries": [{ "iso_2": "gb", "display_name": "United Kingdom" }],
        }))
        .await;

    let body: serde_json::Value = ctx
        .client
        .get(ctx.url("/gb/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("cart JSON");
    assert_eq!(body["currency_code"], "gbp");
    assert_eq!(ctx.backend.region_requests(), 2);
}

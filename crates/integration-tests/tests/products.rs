//! Listing, detail, and cross-cutting page behavior.

#![allow(clippy::unwrap_used)]

use catalog_integration_tests::{FakeBackend, TestContext};
use reqwest::StatusCode;

// =============================================================================
// Health & Headers
// =============================================================================

#[tokio::test]
async fn test_health_does_not_touch_backend() {
    let ctx = TestContext::new().await;

    let resp = ctx.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
    assert_eq!(ctx.backend.list_requests(), 0);
}

#[tokio::test]
async fn test_pages_carry_security_headers_and_request_id() {
    let ctx = TestContext::new().await;

    let resp = ctx.get("/products").await;
    let headers = resp.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers["cache-control"].to_str().unwrap().contains("no-store"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let ctx = TestContext::new().await;

    let resp = ctx.get("/static/js/catalog.js").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp.headers().contains_key("cache-control"));
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_listing_first_page_disables_previous() {
    let ctx = TestContext::start(FakeBackend::with_products(5), &[("CATALOG_PAGE_SIZE", "2")]).await;

    let body = ctx.get_text("/products").await;
    assert!(body.contains("Product 1"));
    assert!(body.contains("Product 2"));
    assert!(!body.contains("Product 3"));
    assert!(body.contains("$10.01"));
    assert!(body.contains("Page 1 of 3"));
    assert!(body.contains(r#"aria-disabled="true">Previous"#));
    assert!(body.contains(r#"href="/products?page=2""#));
}

#[tokio::test]
async fn test_listing_last_page_disables_next() {
    let ctx = TestContext::start(FakeBackend::with_products(5), &[("CATALOG_PAGE_SIZE", "2")]).await;

    let body = ctx.get_text("/products?page=3").await;
    assert!(body.contains("Product 5"));
    assert!(body.contains("Page 3 of 3"));
    assert!(body.contains(r#"aria-disabled="true">Next"#));
    assert!(body.contains(r#"href="/products?page=2""#));
}

#[tokio::test]
async fn test_listing_root_and_garbage_page_show_first_page() {
    let ctx = TestContext::start(FakeBackend::with_products(5), &[("CATALOG_PAGE_SIZE", "2")]).await;

    assert!(ctx.get_text("/").await.contains("Page 1 of 3"));
    assert!(ctx.get_text("/products?page=abc").await.contains("Page 1 of 3"));
    assert!(ctx.get_text("/products?page=-2").await.contains("Page 1 of 3"));
}

#[tokio::test]
async fn test_empty_catalog_shows_empty_state() {
    let ctx = TestContext::start(FakeBackend::default(), &[]).await;

    let body = ctx.get_text("/products").await;
    assert!(body.contains("No products yet."));
    assert!(body.contains("Page 1 of 1"));
}

#[tokio::test]
async fn test_unreachable_backend_shows_listing_error() {
    let ctx = TestContext::start(
        FakeBackend::default(),
        &[("CATALOG_API_BASE", "http://127.0.0.1:9")],
    )
    .await;

    let resp = ctx.get("/products").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Could not load products"));
    assert!(body.contains("Try again"));
}

// =============================================================================
// Detail
// =============================================================================

#[tokio::test]
async fn test_detail_after_listing_uses_session_cache() {
    let ctx = TestContext::new().await;

    ctx.get("/products").await;
    let body = ctx.get_text("/products/p-2").await;

    assert!(body.contains("Product 2"));
    assert!(body.contains("Description 2"));
    assert_eq!(ctx.backend.detail_requests("p-2"), 0);
}

#[tokio::test]
async fn test_detail_fetches_once_then_caches() {
    let ctx = TestContext::new().await;

    let body = ctx.get_text("/products/p-4").await;
    assert!(body.contains("Product 4"));
    assert_eq!(ctx.backend.detail_requests("p-4"), 1);

    ctx.get("/products/p-4").await;
    assert_eq!(ctx.backend.detail_requests("p-4"), 1);
}

#[tokio::test]
async fn test_detail_selects_gallery_image() {
    let ctx = TestContext::new().await;

    let body = ctx.get_text("/products/p-1?image=1").await;
    assert!(body.contains(r#"class="product-detail__image" src="https://cdn.test/p-1/2.png""#));

    let fallback = ctx.get_text("/products/p-1?image=42").await;
    assert!(fallback.contains(r#"class="product-detail__image" src="https://cdn.test/p-1/1.png""#));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new().await;

    let resp = ctx.get("/products/missing").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.text().await.unwrap().contains("Product Not Found"));
}

#[tokio::test]
async fn test_unreachable_backend_detail_is_bad_gateway() {
    let ctx = TestContext::start(
        FakeBackend::default(),
        &[("CATALOG_API_BASE", "http://127.0.0.1:9")],
    )
    .await;

    let resp = ctx.get("/products/p-1").await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

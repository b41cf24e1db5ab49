//! Smoke tests against a running storefront.
//!
//! These require the storefront to be running (cargo run -p stg-catalog-storefront)
//! with a reachable backend. Run with:
//!
//! ```bash
//! STOREFRONT_BASE_URL=http://localhost:3000 cargo test -p stg-catalog-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode, redirect::Policy};

/// Base URL for the storefront (configurable via environment).
fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_live_health() {
    let resp = client()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_live_catalog_fragments_render() {
    let client = client();
    let base = storefront_base_url();

    let categories = client
        .get(format!("{base}/fragments/categories"))
        .header("hx-request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(categories.status(), StatusCode::OK);

    let products = client
        .get(format!("{base}/fragments/products?category=all"))
        .header("hx-request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(products.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_live_cart_requires_login() {
    let resp = client()
        .get(format!("{}/cart", storefront_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/login")
    );
}

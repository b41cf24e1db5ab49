//! Integration tests for STG Catalog.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no network)
//! cargo test -p stg-catalog-integration-tests
//!
//! # Smoke tests against a running storefront
//! STOREFRONT_BASE_URL=http://localhost:3000 \
//!     cargo test -p stg-catalog-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart`, `checkout`, `catalog`, `session` - services over the in-memory backend
//! - `routes` - the full router, driven with `tower::ServiceExt::oneshot`
//! - `signed_in_routes` - the full router over the in-memory backend, behind a
//!   real login
//! - `live` - HTTP smoke tests, ignored by default

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;

use stg_catalog_core::{CategoryId, ProductId};
use stg_catalog_storefront::backend::{InMemoryBackend, Table};
use stg_catalog_storefront::config::{BackendConfig, StorefrontConfig};
use stg_catalog_storefront::models::{AuthSession, Category, Product, UserMetadata};
use stg_catalog_storefront::state::AppState;

/// Password used by every seeded account.
pub const PASSWORD: &str = "segredo1";

/// Configuration for an app whose backend is never reachable.
///
/// Port 9 (discard) refuses connections, so any handler that reaches the
/// backend fails fast instead of hanging.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid IP address"),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("k7Qp2vXz9LmR4tWc8NbY3hJs6FgD1aEu"),
        backend: BackendConfig {
            url: "http://127.0.0.1:9".to_string(),
            anon_key: SecretString::from("test-anon-key"),
            request_timeout: Some(std::time::Duration::from_secs(2)),
        },
        messaging_country_code: "55".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Application state over [`test_config`].
#[must_use]
pub fn offline_state() -> AppState {
    AppState::new(test_config()).expect("test config builds a backend client")
}

/// Application state whose handlers share `backend` with the test.
#[must_use]
pub fn memory_state(backend: Arc<InMemoryBackend>) -> AppState {
    AppState::with_backend(test_config(), backend)
}

/// A category with slug `name`.
#[must_use]
pub fn category(name: &str, title: &str) -> Category {
    Category {
        id: CategoryId::generate(),
        name: name.to_string(),
        title: title.to_string(),
        created_at: Utc::now(),
    }
}

/// A product priced at `cents` hundredths of a real.
#[must_use]
pub fn product(name: &str, cents: i64, category_id: CategoryId) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_string(),
        description: Some(format!("{name} de teste")),
        price: Decimal::new(cents, 2),
        image_url: None,
        category_id,
        created_at: Utc::now(),
    }
}

/// Seed `products` and return them unchanged.
pub fn seed_products(backend: &InMemoryBackend, products: Vec<Product>) -> Vec<Product> {
    backend.seed(Table::Products, &products);
    products
}

/// Register an account and issue it a session valid for one hour.
#[must_use]
pub fn signed_in(backend: &InMemoryBackend, email: &str) -> AuthSession {
    let identity = backend.register(
        email,
        PASSWORD,
        UserMetadata {
            name: Some("Ana Souza".to_string()),
            phone: Some("11987654321".to_string()),
        },
    );
    backend.issue_session(&identity, Duration::hours(1))
}

/// Form-encode `pairs` as an `application/x-www-form-urlencoded` body.
#[must_use]
pub fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_body_encodes_reserved_characters() {
        let body = form_body(&[("email", "ana@example.com"), ("name", "Ana Souza")]);
        assert_eq!(body, "email=ana%40example.com&name=Ana%20Souza");
    }

    #[test]
    fn test_config_is_plain_http() {
        let config = test_config();
        assert!(!config.is_secure());
        assert_eq!(config.socket_addr().port(), 3000);
    }
}

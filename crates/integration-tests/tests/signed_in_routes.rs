//! Signed-in requests through the full router.
//!
//! Each test logs in through `POST /login` against an in-memory backend and
//! replays the session cookie on later requests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;

use stg_catalog_core::CategoryId;
use stg_catalog_integration_tests::{
    PASSWORD, form_body, memory_state, product, seed_products, signed_in,
};
use stg_catalog_storefront::backend::{InMemoryBackend, Operation, Table};
use stg_catalog_storefront::models::{CartLine, Product};
use stg_catalog_storefront::routes::app;

struct Shop {
    app: Router,
    backend: Arc<InMemoryBackend>,
    cookie: String,
    widget: Product,
}

impl Shop {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        let request = Request::builder()
            .uri(uri)
            .header(header::COOKIE, &self.cookie)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn post(&self, uri: &str, pairs: &[(&str, &str)]) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, &self.cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("hx-request", "true")
            .body(Body::from(form_body(pairs)))
            .unwrap();
        self.send(request).await
    }

    async fn add_widget(&self) -> Response {
        let id = self.widget.id.to_string();
        self.post("/cart/add", &[("product_id", &id), ("view", "card")])
            .await
    }

    fn cart(&self) -> Vec<CartLine> {
        self.backend.rows(Table::CartItems)
    }
}

/// Seed a catalog, register Ana and sign her in through the login form.
async fn shop() -> Shop {
    let backend = Arc::new(InMemoryBackend::new());
    let category = CategoryId::generate();
    let widget = seed_products(
        &backend,
        vec![product("Widget", 1000, category), product("Gadget", 550, category)],
    )
    .remove(0);
    let _ = signed_in(&backend, "ana@example.com");
    let app = app(memory_state(Arc::clone(&backend)));

    let login = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", "203.0.113.20")
        .body(Body::from(form_body(&[
            ("email", "ana@example.com"),
            ("password", PASSWORD),
        ])))
        .unwrap();
    let response = app.clone().oneshot(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(header_value(&response, "location"), Some("/"));

    let cookie = header_value(&response, "set-cookie")
        .and_then(|value| value.split(';').next())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("stg_session="));

    Shop {
        app,
        backend,
        cookie,
        widget,
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn header_value<'r>(response: &'r Response, name: &str) -> Option<&'r str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_cart_page_is_open_after_login() {
    let shop = shop().await;
    let response = shop.get("/cart").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Sair"));
}

#[tokio::test]
async fn test_add_update_remove() {
    let shop = shop().await;
    let id = shop.widget.id.to_string();

    let response = shop.add_widget().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, "hx-trigger"), Some("cart-updated"));
    assert!(body_text(response).await.contains("Produto adicionado ao carrinho"));
    assert_eq!(shop.cart().len(), 1);
    assert_eq!(shop.cart().first().unwrap().quantity, 1);

    let count = body_text(shop.get("/cart/count").await).await;
    assert!(count.contains(">1</span>"));

    let response = shop
        .post(
            "/cart/update",
            &[("product_id", &id), ("quantity", "3"), ("view", "cart")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Widget"));
    assert_eq!(shop.cart().first().unwrap().quantity, 3);

    let response = shop
        .post("/cart/remove", &[("product_id", &id), ("view", "cart")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Produto removido do carrinho"));
    assert!(shop.cart().is_empty());
}

#[tokio::test]
async fn test_confirm_places_order_and_opens_messaging_link() {
    let shop = shop().await;
    shop.add_widget().await;

    let response = shop.post("/cart/confirm", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let trigger = header_value(&response, "hx-trigger").unwrap().to_string();
    assert!(trigger.contains("open-external"));
    assert!(trigger.contains("https://api.whatsapp.com/send?phone=5511987654321"));
    assert!(body_text(response).await.contains("Pedido confirmado com sucesso!"));

    assert!(shop.cart().is_empty());
    assert_eq!(shop.backend.count(Table::Orders), 1);
    assert_eq!(shop.backend.count(Table::OrderItems), 1);

    let response = shop.get("/orders").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Widget"));
}

#[tokio::test]
async fn test_confirm_with_failed_line_insert_keeps_cart() {
    let shop = shop().await;
    shop.add_widget().await;
    shop.backend.fail(Table::OrderItems, Operation::Insert);

    let response = shop.post("/cart/confirm", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, "hx-reswap"), Some("none"));
    assert!(header_value(&response, "hx-trigger").is_none());
    assert!(body_text(response).await.contains("Falha ao confirmar o pedido."));

    assert_eq!(shop.cart().len(), 1);
    assert_eq!(shop.backend.count(Table::Orders), 0);
}

#[tokio::test]
async fn test_orders_page_without_orders() {
    let shop = shop().await;
    let response = shop.get("/orders").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Você ainda não tem pedidos."));
}

#[tokio::test]
async fn test_profile_shows_account_details() {
    let shop = shop().await;
    let response = shop.get("/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Ana Souza"));
    assert!(body.contains("ana@example.com"));
    assert!(body.contains("11987654321"));
}

//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog page
//! GET  /home                   - Redirect to /
//! GET  /health                 - Health check
//!
//! # Catalog (HTMX fragments)
//! GET  /fragments/categories   - Category grid
//! GET  /fragments/products     - Product grid, ?category=all|<id>
//! GET  /product/{id}           - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page (requires auth)
//! POST /cart/add               - Add to cart
//! POST /cart/update            - Set quantity
//! POST /cart/remove            - Remove from cart
//! GET  /cart/count             - Cart count badge
//! GET  /cart/confirm           - Confirmation dialog (requires auth)
//! POST /cart/confirm           - Place the order (requires auth)
//!
//! # Account (requires auth)
//! GET  /orders                 - Order history
//! GET  /profile                - Profile
//!
//! # Auth
//! GET  /login, POST /login     - Sign in (POST rate limited)
//! GET  /register, POST /register - Create account (POST rate limited)
//! POST /logout                 - Sign out
//! ```

pub mod auth;
pub mod cart;
pub mod feedback;
pub mod home;
pub mod orders;
pub mod products;
pub mod profile;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    CspNonce, auth_rate_limiter, create_session_layer, csp_nonce_middleware,
    request_id_middleware, security_headers_middleware,
};
use crate::models::AuthSession;
use crate::state::AppState;

pub use feedback::{Feedback, FeedbackFragment, FeedbackKind};

/// Placeholder image for products without one.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

/// The signed-in user as shown in the header.
#[derive(Clone)]
pub struct LayoutUser {
    pub name: String,
    pub email: String,
}

/// Data every full page passes to `base.html`.
#[derive(Clone)]
pub struct Layout {
    pub nonce: String,
    pub user: Option<LayoutUser>,
}

impl Layout {
    #[must_use]
    pub fn new(nonce: CspNonce, session: Option<&AuthSession>) -> Self {
        Self {
            nonce: nonce.0,
            user: session.map(|s| LayoutUser {
                name: s.identity.name.clone().unwrap_or_else(|| s.identity.email.clone()),
                email: s.identity.email.clone(),
            }),
        }
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/confirm", get(cart::confirm_dialog).post(cart::confirm))
}

/// Create the auth routes. Only the credential POSTs are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create all page and fragment routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/home", get(home::redirect_home))
        .route("/fragments/categories", get(home::categories))
        .route("/fragments/products", get(home::products))
        .route("/product/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .route("/orders", get(orders::index))
        .route("/profile", get(profile::show))
        .merge(auth_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Build the complete application with its middleware stack.
///
/// Sentry layers are added by the binary, outside of this.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(csp_nonce_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

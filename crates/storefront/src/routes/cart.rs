//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every change answers with the re-rendered surface the request came from
//! (a product card, the detail page controls or the cart list), a feedback
//! dialog, and an `HX-Trigger` so the header badge refreshes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use stg_catalog_core::{ProductId, format_brl, messaging_link};

use super::feedback::messages;
use super::home::{ProductCard, ProductCardFragment};
use super::products::{DetailActions, DetailActionsFragment};
use super::{Feedback, Layout, PLACEHOLDER_IMAGE};
use crate::backend::Backend;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireAuth};
use crate::models::Product;
use crate::services::{
    CartError, CartHolder, CartRow, Catalog, CheckoutError, cart_total, confirm_order,
};
use crate::state::AppState;

/// Event that refreshes the cart badge.
const CART_UPDATED: &str = "cart-updated";

type Holder<'a> = CartHolder<'a, Backend>;

/// Which part of the page a cart request should re-render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    #[default]
    Card,
    Detail,
    Cart,
}

/// Add or remove form data.
#[derive(Debug, Deserialize)]
pub struct CartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub view: Surface,
}

/// Set quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub view: Surface,
}

/// Cart row display data for templates.
#[derive(Clone)]
pub struct CartRowView {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub unit_price: String,
    pub quantity: u32,
    pub total: String,
}

impl CartRowView {
    #[must_use]
    pub fn decrement(&self) -> u32 {
        self.quantity.saturating_sub(1).max(1)
    }

    #[must_use]
    pub const fn increment(&self) -> u32 {
        self.quantity.saturating_add(1)
    }
}

impl From<&CartRow> for CartRowView {
    fn from(row: &CartRow) -> Self {
        Self {
            product_id: row.product.id.to_string(),
            name: row.product.name.clone(),
            description: row.product.description.clone().unwrap_or_default(),
            image_url: row
                .product
                .image_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            unit_price: format_brl(row.product.price),
            quantity: row.quantity,
            total: format_brl(row.total()),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartItemsView {
    pub rows: Vec<CartRowView>,
    pub total: String,
}

impl CartItemsView {
    #[must_use]
    pub fn new(rows: &[CartRow]) -> Self {
        Self {
            rows: rows.iter().map(CartRowView::from).collect(),
            total: format_brl(cart_total(rows)),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(&[])
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub items: CartItemsView,
    pub feedback: Option<Feedback>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsFragment {
    pub items: CartItemsView,
    pub feedback: Option<Feedback>,
    /// Empty the confirmation dialog slot out-of-band.
    pub close_dialog: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountFragment {
    pub count: usize,
}

/// Order confirmation dialog fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/confirm_dialog.html")]
pub struct ConfirmDialogFragment {
    pub items: CartItemsView,
}

/// Render `surface` for `product_id` after a successful cart change.
async fn render_surface(
    state: &AppState,
    holder: &Holder<'_>,
    surface: Surface,
    product_id: ProductId,
    product: Option<&Product>,
    feedback: Option<Feedback>,
) -> Response {
    let trigger = AppendHeaders([("HX-Trigger", CART_UPDATED)]);
    match surface {
        Surface::Detail => (
            trigger,
            DetailActionsFragment {
                actions: DetailActions::new(product_id, true, holder.list()),
                feedback,
            },
        )
            .into_response(),
        Surface::Cart => match holder.rows_with_products().await {
            Ok(rows) => (
                trigger,
                CartItemsFragment {
                    items: CartItemsView::new(&rows),
                    feedback,
                    close_dialog: false,
                },
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load cart rows");
                Feedback::error(messages::CART_LOAD_FAILED).alone()
            }
        },
        Surface::Card => {
            let fetched;
            let product = if let Some(product) = product {
                product
            } else {
                let token = holder.owner().map(|s| &s.access_token);
                fetched = match Catalog::new(state.backend(), token).product(product_id).await {
                    Ok(Some(product)) => product,
                    Ok(None) => return Feedback::error(messages::PRODUCT_NOT_FOUND).alone(),
                    Err(e) => {
                        tracing::error!(error = %e, %product_id, "Failed to reload product");
                        return Feedback::error(messages::PRODUCTS_FAILED).alone();
                    }
                };
                &fetched
            };
            (
                trigger,
                ProductCardFragment {
                    card: ProductCard::new(product, true, holder.contains(product_id)),
                    feedback,
                },
            )
                .into_response()
        }
    }
}

/// Display cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(session): RequireAuth,
    nonce: CspNonce,
) -> impl IntoResponse {
    let layout = Layout::new(nonce, Some(&session));

    let rows = match CartHolder::load(state.backend(), Some(session)).await {
        Ok(holder) => holder.rows_with_products().await,
        Err(e) => Err(e),
    };

    match rows {
        Ok(rows) => CartShowTemplate {
            layout,
            items: CartItemsView::new(&rows),
            feedback: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to load cart");
            CartShowTemplate {
                layout,
                items: CartItemsView::empty(),
                feedback: Some(Feedback::error(messages::CART_LOAD_FAILED)),
            }
        }
    }
}

/// Add one unit of a product (HTMX).
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(session): OptionalAuth,
    Form(form): Form<CartForm>,
) -> Response {
    let Some(session) = session else {
        return Feedback::error(messages::LOGIN_REQUIRED_FOR_CART).alone();
    };

    let product = match Catalog::new(state.backend(), Some(&session.access_token))
        .product(form.product_id)
        .await
    {
        Ok(Some(product)) => product,
        Ok(None) => return Feedback::error(messages::PRODUCT_NOT_FOUND).alone(),
        Err(e) => {
            tracing::error!(error = %e, product_id = %form.product_id, "Failed to load product");
            return Feedback::error(messages::ADD_TO_CART_FAILED).alone();
        }
    };

    let mut holder = CartHolder::new(state.backend(), Some(session));
    if let Err(e) = holder.add(&product).await {
        tracing::error!(error = %e, product_id = %product.id, "Failed to add to cart");
        return Feedback::error(messages::ADD_TO_CART_FAILED).alone();
    }

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &product.id.to_string())]));
    render_surface(
        &state,
        &holder,
        form.view,
        product.id,
        Some(&product),
        Some(Feedback::success(messages::ADDED_TO_CART)),
    )
    .await
}

/// Remove a product from the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(session): OptionalAuth,
    Form(form): Form<CartForm>,
) -> Response {
    let mut holder = CartHolder::new(state.backend(), session);
    match holder.remove(form.product_id).await {
        Ok(()) => {
            add_breadcrumb(
                "cart",
                "Removed from cart",
                Some(&[("product_id", &form.product_id.to_string())]),
            );
            render_surface(
                &state,
                &holder,
                form.view,
                form.product_id,
                None,
                Some(Feedback::success(messages::REMOVED_FROM_CART)),
            )
            .await
        }
        Err(CartError::NotSignedIn) => Feedback::error(messages::LOGIN_REQUIRED_FOR_CART).alone(),
        Err(e) => {
            tracing::error!(error = %e, product_id = %form.product_id, "Failed to remove from cart");
            Feedback::error(messages::REMOVE_FROM_CART_FAILED).alone()
        }
    }
}

/// Set the quantity of a cart line (HTMX).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    OptionalAuth(session): OptionalAuth,
    Form(form): Form<QuantityForm>,
) -> Response {
    let mut holder = CartHolder::new(state.backend(), session);
    match holder.set_quantity(form.product_id, form.quantity).await {
        Ok(()) => render_surface(&state, &holder, form.view, form.product_id, None, None).await,
        Err(CartError::NotSignedIn) => Feedback::error(messages::LOGIN_REQUIRED_FOR_CART).alone(),
        Err(e) => {
            tracing::warn!(error = %e, product_id = %form.product_id, "Failed to set quantity");
            Feedback::error(messages::QUANTITY_FAILED).alone()
        }
    }
}

/// Cart count badge (HTMX). Anonymous visitors always see zero.
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(session): OptionalAuth,
) -> impl IntoResponse {
    let count = match CartHolder::load(state.backend(), session).await {
        Ok(holder) => holder.count(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart count");
            0
        }
    };
    CartCountFragment { count }
}

/// Order confirmation dialog (HTMX).
#[instrument(skip(state, session))]
pub async fn confirm_dialog(
    State(state): State<AppState>,
    RequireAuth(session): RequireAuth,
) -> Response {
    let rows = match CartHolder::load(state.backend(), Some(session)).await {
        Ok(holder) => holder.rows_with_products().await,
        Err(e) => Err(e),
    };
    match rows {
        Ok(rows) if rows.is_empty() => Feedback::info(messages::CART_EMPTY).alone(),
        Ok(rows) => ConfirmDialogFragment {
            items: CartItemsView::new(&rows),
        }
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load cart for confirmation");
            Feedback::error(messages::CART_LOAD_FAILED).alone()
        }
    }
}

/// `HX-Trigger` payload after an order: refresh the badge and open the link.
fn placed_trigger(link: &str) -> String {
    serde_json::json!({
        "cart-updated": null,
        "open-external": { "url": link },
    })
    .to_string()
}

/// Place the order for the current cart (HTMX).
///
/// On success the cart list is re-rendered empty, the dialog is closed and
/// the browser is asked to open the messaging link. On failure the dialog
/// stays open so the user can retry.
#[instrument(skip(state, session))]
pub async fn confirm(State(state): State<AppState>, RequireAuth(session): RequireAuth) -> Response {
    let holder = match CartHolder::load(state.backend(), Some(session)).await {
        Ok(holder) => holder,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load cart for order");
            return Feedback::error(messages::ORDER_FAILED).alone();
        }
    };
    let rows = match holder.rows_with_products().await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load cart rows for order");
            return Feedback::error(messages::ORDER_FAILED).alone();
        }
    };

    match confirm_order(state.backend(), holder.owner(), &rows).await {
        Ok(placed) => {
            let phone = holder.owner().and_then(|s| s.identity.phone.as_deref());
            let link = messaging_link(
                &state.config().messaging_country_code,
                phone,
                &placed.summary.render(),
            );
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_id", &placed.order.id.to_string())]),
            );
            (
                AppendHeaders([("HX-Trigger", placed_trigger(&link))]),
                CartItemsFragment {
                    items: CartItemsView::empty(),
                    feedback: Some(Feedback::success(messages::ORDER_CONFIRMED)),
                    close_dialog: true,
                },
            )
                .into_response()
        }
        Err(CheckoutError::NotSignedIn) => Feedback::info(messages::LOGIN_REQUIRED_FOR_ORDER).alone(),
        Err(CheckoutError::EmptyCart) => Feedback::info(messages::CART_EMPTY).alone(),
        Err(e) => {
            tracing::error!(error = %e, "Order confirmation failed");
            Feedback::error(messages::ORDER_FAILED).alone()
        }
    }
}

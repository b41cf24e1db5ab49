//! Catalog page and its HTMX fragments.
//!
//! The page itself renders only placeholder grids; categories and products
//! are fetched independently by the fragments once the page loads.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use stg_catalog_core::format_brl;

use super::feedback::messages;
use super::{Feedback, Layout, PLACEHOLDER_IMAGE};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::{Category, Product};
use crate::services::{CartHolder, Catalog, CategoryFilter};
use crate::state::AppState;

/// Placeholder blocks shown while categories load.
pub const CATEGORY_PLACEHOLDERS: usize = 6;
/// Placeholder blocks shown while products load.
pub const PRODUCT_PLACEHOLDERS: usize = 8;

/// Category button data for templates.
#[derive(Clone)]
pub struct CategoryView {
    pub id: String,
    pub title: String,
    pub glyph: &'static str,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            title: category.title.clone(),
            glyph: category.icon().glyph(),
        }
    }
}

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub signed_in: bool,
    pub in_cart: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, signed_in: bool, in_cart: bool) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: format_brl(product.price),
            image_url: product
                .image_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            signed_in,
            in_cart,
        }
    }
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub category_placeholders: usize,
    pub product_placeholders: usize,
}

/// Category grid fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/categories.html")]
pub struct CategoriesFragment {
    pub categories: Vec<CategoryView>,
    pub feedback: Option<Feedback>,
}

/// Product grid fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/products.html")]
pub struct ProductsFragment {
    pub cards: Vec<ProductCard>,
    pub feedback: Option<Feedback>,
}

/// Single product card fragment, re-rendered after a cart change.
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_card_fragment.html")]
pub struct ProductCardFragment {
    pub card: ProductCard,
    pub feedback: Option<Feedback>,
}

/// Query for the product grid.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// Display the catalog page.
pub async fn home(OptionalAuth(session): OptionalAuth, nonce: CspNonce) -> impl IntoResponse {
    HomeTemplate {
        layout: Layout::new(nonce, session.as_ref()),
        category_placeholders: CATEGORY_PLACEHOLDERS,
        product_placeholders: PRODUCT_PLACEHOLDERS,
    }
}

/// `/home` is an alias of the catalog page.
pub async fn redirect_home() -> Redirect {
    Redirect::permanent("/")
}

/// Category grid fragment.
#[instrument(skip(state, session))]
pub async fn categories(
    State(state): State<AppState>,
    OptionalAuth(session): OptionalAuth,
) -> impl IntoResponse {
    let token = session.as_ref().map(|s| &s.access_token);
    match Catalog::new(state.backend(), token).categories().await {
        Ok(categories) => CategoriesFragment {
            categories: categories.iter().map(CategoryView::from).collect(),
            feedback: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to load categories");
            CategoriesFragment {
                categories: Vec::new(),
                feedback: Some(Feedback::error(messages::CATEGORIES_FAILED)),
            }
        }
    }
}

/// Product grid fragment, optionally filtered by category.
#[instrument(skip(state, session))]
pub async fn products(
    State(state): State<AppState>,
    OptionalAuth(session): OptionalAuth,
    Query(query): Query<ProductsQuery>,
) -> Result<Response, AppError> {
    let filter: CategoryFilter = query
        .category
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| AppError::BadRequest("invalid category".to_string()))?;

    let signed_in = session.is_some();
    let holder = match CartHolder::load(state.backend(), session).await {
        Ok(holder) => holder,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart for product grid");
            CartHolder::new(state.backend(), None)
        }
    };
    let token = holder.owner().map(|s| &s.access_token);

    let fragment = match Catalog::new(state.backend(), token).products(filter).await {
        Ok(products) => ProductsFragment {
            cards: products
                .iter()
                .map(|p| ProductCard::new(p, signed_in, holder.contains(p.id)))
                .collect(),
            feedback: None,
        },
        Err(e) => {
            tracing::error!(error = %e, %filter, "Failed to load products");
            ProductsFragment {
                cards: Vec::new(),
                feedback: Some(Feedback::error(messages::PRODUCTS_FAILED)),
            }
        }
    };
    Ok(fragment.into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use stg_catalog_core::{CategoryId, ProductId};

    use super::*;

    fn product(image_url: Option<&str>) -> Product {
        Product {
            id: ProductId::generate(),
            name: "Fone Bluetooth".to_string(),
            description: None,
            price: Decimal::new(19990, 2),
            image_url: image_url.map(String::from),
            category_id: CategoryId::generate(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_card_uses_placeholder_image() {
        let card = ProductCard::new(&product(None), false, false);
        assert_eq!(card.image_url, PLACEHOLDER_IMAGE);
        assert_eq!(card.price, "R$\u{a0}199,90");
    }

    #[test]
    fn test_card_button_follows_cart_state() {
        let html = ProductCardFragment {
            card: ProductCard::new(&product(Some("https://img.test/a.png")), true, true),
            feedback: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("Remover do carrinho"));

        let anonymous = ProductCardFragment {
            card: ProductCard::new(&product(None), false, false),
            feedback: None,
        }
        .render()
        .unwrap();
        assert!(!anonymous.contains("Adicionar ao carrinho"));
    }

    #[test]
    fn test_products_fragment_empty_state() {
        let html = ProductsFragment {
            cards: Vec::new(),
            feedback: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("Nenhum produto encontrado"));
    }
}

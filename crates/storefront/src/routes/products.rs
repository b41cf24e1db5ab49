//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use stg_catalog_core::{ProductId, format_brl};

use super::{Feedback, Layout, PLACEHOLDER_IMAGE};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::{CartLine, Product};
use crate::services::{CartHolder, Catalog};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: format_brl(product.price),
            image_url: product
                .image_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        }
    }
}

/// Cart controls on the detail page.
#[derive(Clone)]
pub struct DetailActions {
    pub product_id: String,
    pub signed_in: bool,
    /// Quantity in the cart; `None` when the product is not in it.
    pub quantity: Option<u32>,
}

impl DetailActions {
    #[must_use]
    pub fn new(product_id: ProductId, signed_in: bool, lines: &[CartLine]) -> Self {
        Self {
            product_id: product_id.to_string(),
            signed_in,
            quantity: lines
                .iter()
                .find(|line| line.product_id == product_id)
                .map(|line| line.quantity),
        }
    }

    /// Quantity sent by the minus button; never below 1.
    #[must_use]
    pub fn decrement(&self) -> u32 {
        self.quantity.unwrap_or(1).saturating_sub(1).max(1)
    }

    #[must_use]
    pub fn increment(&self) -> u32 {
        self.quantity.unwrap_or(0).saturating_add(1)
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "product/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub actions: DetailActions,
}

/// Detail actions fragment, re-rendered after a cart change.
#[derive(Template, WebTemplate)]
#[template(path = "partials/detail_actions_fragment.html")]
pub struct DetailActionsFragment {
    pub actions: DetailActions,
    pub feedback: Option<Feedback>,
}

/// Display a product.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(session): OptionalAuth,
    nonce: CspNonce,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    let signed_in = session.is_some();
    let holder = match CartHolder::load(state.backend(), session.clone()).await {
        Ok(holder) => holder,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart for product page");
            CartHolder::new(state.backend(), None)
        }
    };

    let token = session.as_ref().map(|s| &s.access_token);
    let product = Catalog::new(state.backend(), token)
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductShowTemplate {
        layout: Layout::new(nonce, session.as_ref()),
        product: ProductView::from(&product),
        actions: DetailActions::new(product.id, signed_in, holder.list()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stg_catalog_core::{CartLineId, UserId};

    use super::*;

    #[test]
    fn test_detail_actions_quantity() {
        let product_id = ProductId::generate();
        let lines = vec![CartLine {
            id: CartLineId::generate(),
            user_id: UserId::generate(),
            product_id,
            quantity: 1,
        }];

        let actions = DetailActions::new(product_id, true, &lines);
        assert_eq!(actions.quantity, Some(1));
        assert_eq!(actions.decrement(), 1);
        assert_eq!(actions.increment(), 2);

        let absent = DetailActions::new(ProductId::generate(), true, &lines);
        assert_eq!(absent.quantity, None);
    }

    #[test]
    fn test_detail_actions_render() {
        let html = DetailActionsFragment {
            actions: DetailActions {
                product_id: ProductId::generate().to_string(),
                signed_in: true,
                quantity: Some(3),
            },
            feedback: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("Remover"));
        assert!(html.contains(">3<"));
    }
}

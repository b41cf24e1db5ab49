//! Cart holder.
//!
//! Mirrors the signed-in user's `cart_items` rows. Every mutation goes to the
//! backend (filtered by both user and product) and is followed by a full
//! re-read, so after a successful call the mirror reflects that mutation.
//! Anonymous holders have an empty mirror and refuse mutations.

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use stg_catalog_core::{CartLineId, ProductId, line_total};

use crate::backend::{Gateway, GatewayError, Query, Table};
use crate::models::{AuthSession, CartLine, NewCartLine, Product, QuantityPatch};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("not signed in")]
    NotSignedIn,

    /// Quantities below one are rejected; use remove instead.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// A cart line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRow {
    pub line_id: CartLineId,
    pub quantity: u32,
    pub product: Product,
}

impl CartRow {
    #[must_use]
    pub fn total(&self) -> Decimal {
        line_total(self.product.price, self.quantity)
    }
}

/// Sum of every row's line total.
#[must_use]
pub fn cart_total(rows: &[CartRow]) -> Decimal {
    rows.iter().map(CartRow::total).sum()
}

/// The cart of one caller.
pub struct CartHolder<'g, G> {
    gateway: &'g G,
    owner: Option<AuthSession>,
    lines: Vec<CartLine>,
}

impl<'g, G: Gateway> CartHolder<'g, G> {
    /// A holder with an empty mirror. Call [`Self::refresh`] to populate it.
    #[must_use]
    pub const fn new(gateway: &'g G, owner: Option<AuthSession>) -> Self {
        Self {
            gateway,
            owner,
            lines: Vec::new(),
        }
    }

    /// A holder populated from the backend.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the cart cannot be read.
    pub async fn load(gateway: &'g G, owner: Option<AuthSession>) -> Result<Self, CartError> {
        let mut holder = Self::new(gateway, owner);
        holder.refresh().await?;
        Ok(holder)
    }

    /// Follow an auth state change: adopt `owner` and re-read.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the new owner's cart cannot be read; the
    /// mirror is left empty in that case.
    pub async fn switch_owner(&mut self, owner: Option<AuthSession>) -> Result<(), CartError> {
        self.owner = owner;
        self.lines.clear();
        self.refresh().await
    }

    #[must_use]
    pub const fn owner(&self) -> Option<&AuthSession> {
        self.owner.as_ref()
    }

    /// The mirrored lines.
    #[must_use]
    pub fn list(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.lines.iter().any(|line| line.product_id == product_id)
    }

    fn require_owner(&self) -> Result<&AuthSession, CartError> {
        self.owner.as_ref().ok_or(CartError::NotSignedIn)
    }

    /// Replace the mirror with the backend's rows for this user.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the mirror is unchanged in that case.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), CartError> {
        let Some(owner) = &self.owner else {
            self.lines.clear();
            return Ok(());
        };
        let lines = self
            .gateway
            .select(
                Table::CartItems,
                &Query::new().eq("user_id", owner.identity.id),
                Some(&owner.access_token),
            )
            .await?;
        self.lines = lines;
        Ok(())
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line if the product is already in the cart,
    /// otherwise inserts a line with quantity one.
    ///
    /// # Errors
    ///
    /// `NotSignedIn` for anonymous holders, else the gateway error.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&mut self, product: &Product) -> Result<(), CartError> {
        let owner = self.require_owner()?;
        let user_id = owner.identity.id;
        let token = Some(&owner.access_token);
        let line_query = Query::new()
            .eq("user_id", user_id)
            .eq("product_id", product.id);

        let existing: Vec<CartLine> = self
            .gateway
            .select(Table::CartItems, &line_query, token)
            .await?;

        match existing.first() {
            Some(line) => {
                let patch = QuantityPatch {
                    quantity: line.quantity.saturating_add(1),
                };
                self.gateway
                    .update(
                        Table::CartItems,
                        &Query::new().eq("id", line.id),
                        &patch,
                        token,
                    )
                    .await?;
            }
            None => {
                let row = NewCartLine {
                    user_id,
                    product_id: product.id,
                    quantity: 1,
                };
                let _: CartLine = self
                    .gateway
                    .insert_one(Table::CartItems, &row, token)
                    .await?;
            }
        }

        self.refresh().await
    }

    /// Remove the line for `product_id`.
    ///
    /// # Errors
    ///
    /// `NotSignedIn` for anonymous holders, else the gateway error.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let owner = self.require_owner()?;
        self.gateway
            .delete(
                Table::CartItems,
                &Query::new()
                    .eq("user_id", owner.identity.id)
                    .eq("product_id", product_id),
                Some(&owner.access_token),
            )
            .await?;
        self.refresh().await
    }

    /// Set the quantity of the line for `product_id`.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` when `quantity < 1` (checked first, nothing is
    /// sent), `NotSignedIn` for anonymous holders, else the gateway error.
    #[instrument(skip(self))]
    pub async fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<(), CartError> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or(CartError::InvalidQuantity(quantity))?;
        let owner = self.require_owner()?;
        self.gateway
            .update(
                Table::CartItems,
                &Query::new()
                    .eq("user_id", owner.identity.id)
                    .eq("product_id", product_id),
                &QuantityPatch { quantity },
                Some(&owner.access_token),
            )
            .await?;
        self.refresh().await
    }

    /// The mirror joined with current product rows, in mirror order.
    ///
    /// Every line yields its own row, so two lines for the same product stay
    /// two rows. Lines whose product no longer exists are left out.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the products cannot be read.
    #[instrument(skip(self))]
    pub async fn rows_with_products(&self) -> Result<Vec<CartRow>, CartError> {
        if self.lines.is_empty() {
            return Ok(Vec::new());
        }

        let token = self.owner.as_ref().map(|owner| &owner.access_token);
        let products: Vec<Product> = self
            .gateway
            .select(
                Table::Products,
                &Query::new().in_list("id", self.lines.iter().map(|line| line.product_id)),
                token,
            )
            .await?;
        let by_id: HashMap<ProductId, Product> =
            products.into_iter().map(|p| (p.id, p)).collect();

        Ok(self
            .lines
            .iter()
            .filter_map(|line| {
                by_id.get(&line.product_id).cloned().map(|product| CartRow {
                    line_id: line.id,
                    quantity: line.quantity,
                    product,
                })
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::{Duration, Utc};
    use stg_catalog_core::CategoryId;

    use super::*;
    use crate::backend::{InMemoryBackend, Operation};
    use crate::models::UserMetadata;

    pub(crate) fn product(name: &str, cents: i64) -> Product {
        Product {
            id: ProductId::generate(),
            name: name.to_string(),
            description: None,
            price: Decimal::new(cents, 2),
            image_url: None,
            category_id: CategoryId::generate(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn signed_in(backend: &InMemoryBackend) -> AuthSession {
        let identity = backend.register("ana@example.com", "segredo1", UserMetadata::default());
        backend.issue_session(&identity, Duration::hours(1))
    }

    #[tokio::test]
    async fn test_anonymous_cart_is_empty_and_refuses_mutations() {
        let backend = InMemoryBackend::new();
        let widget = product("Widget", 1000);
        let mut cart = CartHolder::load(&backend, None).await.unwrap();

        assert!(cart.list().is_empty());
        assert!(matches!(cart.add(&widget).await, Err(CartError::NotSignedIn)));
        assert!(matches!(cart.remove(widget.id).await, Err(CartError::NotSignedIn)));
        assert_eq!(backend.mutations(), 0);
    }

    #[tokio::test]
    async fn test_add_twice_merges_into_one_line() {
        let backend = InMemoryBackend::new();
        let widget = product("Widget", 1000);
        backend.seed(Table::Products, [&widget]);
        let mut cart = CartHolder::load(&backend, Some(signed_in(&backend))).await.unwrap();

        cart.add(&widget).await.unwrap();
        cart.add(&widget).await.unwrap();

        assert_eq!(cart.count(), 1);
        assert_eq!(cart.list()[0].quantity, 2);
        assert_eq!(backend.count(Table::CartItems), 1);
    }

    #[tokio::test]
    async fn test_set_quantity_reflects_value() {
        let backend = InMemoryBackend::new();
        let widget = product("Widget", 1000);
        let mut cart = CartHolder::load(&backend, Some(signed_in(&backend))).await.unwrap();
        cart.add(&widget).await.unwrap();

        cart.set_quantity(widget.id, 5).await.unwrap();
        assert_eq!(cart.list()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_set_quantity_below_one_sends_nothing() {
        let backend = InMemoryBackend::new();
        let widget = product("Widget", 1000);
        let mut cart = CartHolder::load(&backend, Some(signed_in(&backend))).await.unwrap();
        cart.add(&widget).await.unwrap();
        let before = backend.mutations();
        let mirror = cart.list().to_vec();

        for q in [0, -3] {
            assert!(matches!(
                cart.set_quantity(widget.id, q).await,
                Err(CartError::InvalidQuantity(_))
            ));
        }
        assert_eq!(backend.mutations(), before);
        assert_eq!(cart.list(), mirror.as_slice());
    }

    #[tokio::test]
    async fn test_remove_only_touches_own_line() {
        let backend = InMemoryBackend::new();
        let widget = product("Widget", 1000);
        let stranger = UserMetadata::default();
        let other = backend.register("bob@example.com", "segredo1", stranger);
        let other_session = backend.issue_session(&other, Duration::hours(1));

        let mut mine = CartHolder::load(&backend, Some(signed_in(&backend))).await.unwrap();
        let mut theirs = CartHolder::load(&backend, Some(other_session)).await.unwrap();
        mine.add(&widget).await.unwrap();
        theirs.add(&widget).await.unwrap();

        mine.remove(widget.id).await.unwrap();
        theirs.refresh().await.unwrap();

        assert!(mine.list().is_empty());
        assert_eq!(theirs.count(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_mirror() {
        let backend = InMemoryBackend::new();
        let widget = product("Widget", 1000);
        let mut cart = CartHolder::load(&backend, Some(signed_in(&backend))).await.unwrap();
        cart.add(&widget).await.unwrap();
        backend.fail(Table::CartItems, Operation::Delete);

        assert!(matches!(cart.remove(widget.id).await, Err(CartError::Gateway(_))));
        assert!(cart.contains(widget.id));
    }

    #[tokio::test]
    async fn test_rows_with_products_drops_missing_products() {
        let backend = InMemoryBackend::new();
        let widget = product("Widget", 1000);
        let ghost = product("Ghost", 100);
        backend.seed(Table::Products, [&widget]);
        let mut cart = CartHolder::load(&backend, Some(signed_in(&backend))).await.unwrap();
        cart.add(&ghost).await.unwrap();
        cart.add(&widget).await.unwrap();
        cart.set_quantity(widget.id, 3).await.unwrap();

        let rows = cart.rows_with_products().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product.name, "Widget");
        assert_eq!(cart_total(&rows), Decimal::new(3000, 2));
    }

    #[tokio::test]
    async fn test_switch_owner_follows_auth_change() {
        let backend = InMemoryBackend::new();
        let widget = product("Widget", 1000);
        let session = signed_in(&backend);
        let mut cart = CartHolder::load(&backend, Some(session.clone())).await.unwrap();
        cart.add(&widget).await.unwrap();

        cart.switch_owner(None).await.unwrap();
        assert!(cart.list().is_empty());

        cart.switch_owner(Some(session)).await.unwrap();
        assert_eq!(cart.count(), 1);
    }
}

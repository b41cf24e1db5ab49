//! Catalog reads.

use std::str::FromStr;

use tracing::instrument;

use stg_catalog_core::{CategoryId, ProductId};

use crate::backend::{Gateway, GatewayError, Query, Table};
use crate::models::{AccessToken, Category, Product};

/// Which products to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(CategoryId),
}

impl FromStr for CategoryFilter {
    type Err = uuid::Error;

    /// `"all"` (or an empty string) lists everything; anything else must be
    /// a category id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(Self::All),
            id => id.parse().map(Self::Category),
        }
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Category(id) => write!(f, "{id}"),
        }
    }
}

/// Catalog reads. Anonymous callers see the same catalog.
pub struct Catalog<'g, G> {
    gateway: &'g G,
    token: Option<&'g AccessToken>,
}

impl<'g, G: Gateway> Catalog<'g, G> {
    #[must_use]
    pub const fn new(gateway: &'g G, token: Option<&'g AccessToken>) -> Self {
        Self { gateway, token }
    }

    /// Every category.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, GatewayError> {
        self.gateway
            .select(Table::Categories, &Query::new(), self.token)
            .await
    }

    /// Products, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn products(&self, filter: CategoryFilter) -> Result<Vec<Product>, GatewayError> {
        let query = match filter {
            CategoryFilter::All => Query::new(),
            CategoryFilter::Category(id) => Query::new().eq("category_id", id),
        };
        self.gateway.select(Table::Products, &query, self.token).await
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, GatewayError> {
        let rows: Vec<Product> = self
            .gateway
            .select(Table::Products, &Query::new().eq("id", id), self.token)
            .await?;
        Ok(rows.into_iter().next())
    }
}

//! Catalog rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stg_catalog_core::{CategoryIcon, CategoryId, ProductId};

/// A product for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

/// A product category. `name` is a slug, `title` the display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    #[must_use]
    pub fn icon(&self) -> CategoryIcon {
        CategoryIcon::from_slug(&self.name)
    }
}

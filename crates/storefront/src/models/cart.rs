//! Cart rows.

use serde::{Deserialize, Serialize};

use stg_catalog_core::{CartLineId, ProductId, UserId};

/// One product in a user's cart. At most one line per (user, product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuantityPatch {
    pub quantity: u32,
}

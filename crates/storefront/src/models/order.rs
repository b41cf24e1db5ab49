//! Order rows.
//!
//! Order lines snapshot the product name and unit price at purchase time, so
//! later catalog edits never rewrite history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use stg_catalog_core::{OrderId, OrderLineId, OrderStatus, ProductId, UserId, line_total};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// First eight characters of the id, for display.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.id.to_string().chars().take(8).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Decimal,
    pub status: OrderStatus,
}

/// A purchased product within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted from the catalog.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    #[must_use]
    pub fn total(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrderLine {
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_null_status_reads_as_pending() {
        let json = serde_json::json!({
            "id": "7f1c2a9e-0000-4000-8000-000000000001",
            "user_id": "7f1c2a9e-0000-4000-8000-000000000002",
            "total": 25.5,
            "status": null,
            "created_at": "2026-10-01T12:00:00+00:00"
        });
        let order: Order = serde_json::from_value(json).unwrap();
        assert!(order.status.is_pending());
        assert_eq!(order.total, Decimal::new(255, 1));
        assert_eq!(order.short_id(), "7f1c2a9e");
    }

    #[test]
    fn test_unknown_status_is_kept() {
        let json = serde_json::json!({
            "id": "7f1c2a9e-0000-4000-8000-000000000001",
            "user_id": "7f1c2a9e-0000-4000-8000-000000000002",
            "total": "10.00",
            "status": "shipped",
            "created_at": "2026-10-01T12:00:00Z"
        });
        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.status.as_str(), "shipped");
    }

    #[test]
    fn test_line_total() {
        let line = OrderLine {
            id: OrderLineId::generate(),
            order_id: OrderId::generate(),
            product_id: None,
            product_name: "Widget".to_string(),
            unit_price: Decimal::new(1000, 2),
            quantity: 3,
        };
        assert_eq!(line.total(), Decimal::new(3000, 2));
    }
}

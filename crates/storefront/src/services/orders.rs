//! Order history.

use std::collections::HashMap;

use tracing::instrument;

use stg_catalog_core::OrderId;

use crate::backend::{Direction, Gateway, GatewayError, Query, Table};
use crate::models::{AuthSession, Order, OrderLine};

/// An order with its lines, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Reads a user's past orders.
pub struct OrderHistory<'g, G> {
    gateway: &'g G,
}

impl<'g, G: Gateway> OrderHistory<'g, G> {
    #[must_use]
    pub const fn new(gateway: &'g G) -> Self {
        Self { gateway }
    }

    /// Orders for `owner`, newest first, each with its lines.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if either read fails.
    #[instrument(skip_all, fields(user_id = %owner.identity.id))]
    pub async fn history(&self, owner: &AuthSession) -> Result<Vec<OrderWithLines>, GatewayError> {
        let token = Some(&owner.access_token);
        let orders: Vec<Order> = self
            .gateway
            .select(
                Table::Orders,
                &Query::new()
                    .eq("user_id", owner.identity.id)
                    .order_by("created_at", Direction::Desc),
                token,
            )
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let lines: Vec<OrderLine> = self
            .gateway
            .select(
                Table::OrderItems,
                &Query::new().in_list("order_id", orders.iter().map(|o| o.id)),
                token,
            )
            .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            grouped.entry(line.order_id).or_default().push(line);
        }

        Ok(orders
            .into_iter()
            .map(|order| OrderWithLines {
                lines: grouped.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }
}

//! Order confirmation.
//!
//! The backend has no client-visible multi-statement transaction, so an order
//! is written in steps:
//!
//! 1. check the caller is signed in and the cart is not empty
//! 2. compute the total from the cart rows
//! 3. insert the order (`pending`)
//! 4. insert every line in one batch, snapshotting name and unit price
//! 5. if the line insert fails, delete the order again
//! 6. clear the user's cart
//!
//! A failure in step 6 happens after the order is durable; it is logged and
//! the order still counts as placed.

use thiserror::Error;
use tracing::instrument;

use stg_catalog_core::{OrderStatus, OrderSummary, SummaryLine};

use super::cart::{CartRow, cart_total};
use crate::backend::{Gateway, GatewayError, Query, Table};
use crate::models::{AuthSession, NewOrder, NewOrderLine, Order, OrderLine};

/// Errors from order confirmation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("cart is empty")]
    EmptyCart,

    #[error("failed to create order: {0}")]
    OrderInsert(#[source] GatewayError),

    /// The order row was written but its lines were not.
    #[error("failed to create order lines (order removed: {compensated}): {source}")]
    LineInsert {
        #[source]
        source: GatewayError,
        compensated: bool,
    },
}

/// A successfully placed order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub summary: OrderSummary,
}

/// Place an order for `rows` on behalf of `owner`.
///
/// # Errors
///
/// See [`CheckoutError`]. When an error is returned after step 3 the order
/// row has been deleted again (unless `compensated` is false) and the cart
/// is untouched.
#[instrument(skip_all, fields(line_count = rows.len()))]
pub async fn confirm_order<G: Gateway>(
    gateway: &G,
    owner: Option<&AuthSession>,
    rows: &[CartRow],
) -> Result<PlacedOrder, CheckoutError> {
    let owner = owner.ok_or(CheckoutError::NotSignedIn)?;
    if rows.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let user_id = owner.identity.id;
    let token = Some(&owner.access_token);

    let total = cart_total(rows);

    let order: Order = gateway
        .insert_one(
            Table::Orders,
            &NewOrder {
                user_id,
                total,
                status: OrderStatus::pending(),
            },
            token,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, %user_id, "Order insert failed");
            CheckoutError::OrderInsert(e)
        })?;

    let new_lines: Vec<NewOrderLine> = rows
        .iter()
        .map(|row| NewOrderLine {
            order_id: order.id,
            product_id: Some(row.product.id),
            product_name: row.product.name.clone(),
            unit_price: row.product.price,
            quantity: row.quantity,
        })
        .collect();

    let lines: Vec<OrderLine> = match gateway.insert(Table::OrderItems, &new_lines, token).await {
        Ok(lines) => lines,
        Err(source) => {
            tracing::error!(error = %source, order_id = %order.id, "Order line insert failed");
            let compensated = match gateway
                .delete(Table::Orders, &Query::new().eq("id", order.id), token)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(error = %e, order_id = %order.id, "Failed to remove orphaned order");
                    false
                }
            };
            return Err(CheckoutError::LineInsert {
                source,
                compensated,
            });
        }
    };

    if let Err(e) = gateway
        .delete(Table::CartItems, &Query::new().eq("user_id", user_id), token)
        .await
    {
        tracing::warn!(error = %e, order_id = %order.id, "Order placed but cart was not cleared");
    }

    tracing::info!(order_id = %order.id, total = %order.total, "Order placed");

    let summary = OrderSummary {
        customer_name: owner.identity.name.clone().unwrap_or_default(),
        customer_email: owner.identity.email.clone(),
        lines: rows
            .iter()
            .map(|row| SummaryLine {
                name: row.product.name.clone(),
                quantity: row.quantity,
                unit_price: row.product.price,
            })
            .collect(),
    };

    Ok(PlacedOrder {
        order,
        lines,
        summary,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::backend::{InMemoryBackend, Operation};
    use crate::models::CartLine;
    use crate::services::cart::CartHolder;
    use crate::services::cart::tests::{product, signed_in};

    async fn filled_cart(backend: &InMemoryBackend) -> (AuthSession, Vec<CartRow>) {
        let session = signed_in(backend);
        let widget = product("Widget", 1000);
        let gadget = product("Gadget", 550);
        backend.seed(Table::Products, [&widget, &gadget]);

        let mut cart = CartHolder::load(backend, Some(session.clone())).await.unwrap();
        cart.add(&widget).await.unwrap();
        cart.set_quantity(widget.id, 2).await.unwrap();
        cart.add(&gadget).await.unwrap();
        let rows = cart.rows_with_products().await.unwrap();
        (session, rows)
    }

    #[tokio::test]
    async fn test_places_order_and_clears_cart() {
        let backend = InMemoryBackend::new();
        let (session, rows) = filled_cart(&backend).await;

        let placed = confirm_order(&backend, Some(&session), &rows).await.unwrap();

        assert_eq!(placed.order.total, Decimal::new(2550, 2));
        assert!(placed.order.status.is_pending());
        assert_eq!(placed.lines.len(), 2);
        assert!(placed.lines.iter().all(|l| l.order_id == placed.order.id));
        assert_eq!(placed.summary.total(), placed.order.total);
        assert!(backend.rows::<CartLine>(Table::CartItems).is_empty());
    }

    #[tokio::test]
    async fn test_preconditions_send_nothing() {
        let backend = InMemoryBackend::new();
        let (session, rows) = filled_cart(&backend).await;
        let before = backend.mutations();

        assert!(matches!(
            confirm_order(&backend, None, &rows).await,
            Err(CheckoutError::NotSignedIn)
        ));
        assert!(matches!(
            confirm_order(&backend, Some(&session), &[]).await,
            Err(CheckoutError::EmptyCart)
        ));
        assert_eq!(backend.mutations(), before);
    }

    #[tokio::test]
    async fn test_order_insert_failure_keeps_cart() {
        let backend = InMemoryBackend::new();
        let (session, rows) = filled_cart(&backend).await;
        backend.fail(Table::Orders, Operation::Insert);

        let result = confirm_order(&backend, Some(&session), &rows).await;
        assert!(matches!(result, Err(CheckoutError::OrderInsert(_))));
        assert_eq!(backend.count(Table::Orders), 0);
        assert_eq!(backend.count(Table::CartItems), 2);
    }

    #[tokio::test]
    async fn test_line_failure_removes_order() {
        let backend = InMemoryBackend::new();
        let (session, rows) = filled_cart(&backend).await;
        backend.fail(Table::OrderItems, Operation::Insert);

        let result = confirm_order(&backend, Some(&session), &rows).await;
        assert!(matches!(
            result,
            Err(CheckoutError::LineInsert {
                compensated: true,
                ..
            })
        ));
        assert_eq!(backend.count(Table::Orders), 0);
        assert_eq!(backend.count(Table::OrderItems), 0);
        assert_eq!(backend.count(Table::CartItems), 2);
    }

    #[tokio::test]
    async fn test_failed_compensation_is_reported() {
        let backend = InMemoryBackend::new();
        let (session, rows) = filled_cart(&backend).await;
        backend.fail(Table::OrderItems, Operation::Insert);
        backend.fail(Table::Orders, Operation::Delete);

        let result = confirm_order(&backend, Some(&session), &rows).await;
        assert!(matches!(
            result,
            Err(CheckoutError::LineInsert {
                compensated: false,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cart_clear_failure_still_confirms() {
        let backend = InMemoryBackend::new();
        let (session, rows) = filled_cart(&backend).await;
        backend.fail(Table::CartItems, Operation::Delete);

        let placed = confirm_order(&backend, Some(&session), &rows).await.unwrap();
        assert_eq!(placed.lines.len(), 2);
        assert_eq!(backend.count(Table::Orders), 1);
        assert_eq!(backend.count(Table::CartItems), 2);
    }

    #[tokio::test]
    async fn test_duplicate_cart_lines_are_all_ordered() {
        let backend = InMemoryBackend::new();
        let session = signed_in(&backend);
        let widget = product("Widget", 1000);
        backend.seed(Table::Products, [&widget]);
        let user_id = session.identity.id;
        backend.seed(
            Table::CartItems,
            [2, 3].map(|quantity| CartLine {
                id: stg_catalog_core::CartLineId::generate(),
                user_id,
                product_id: widget.id,
                quantity,
            }),
        );

        let cart = CartHolder::load(&backend, Some(session.clone())).await.unwrap();
        let rows = cart.rows_with_products().await.unwrap();
        assert_eq!(rows.len(), 2);

        let placed = confirm_order(&backend, Some(&session), &rows).await.unwrap();
        let ordered: u32 = placed.lines.iter().map(|l| l.quantity).sum();
        assert_eq!(ordered, 5);
        assert_eq!(placed.order.total, Decimal::new(5000, 2));
        assert_eq!(backend.count(Table::CartItems), 0);
    }
}

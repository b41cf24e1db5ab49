//! Order history page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::{DateTime, FixedOffset, Utc};
use tracing::instrument;

use stg_catalog_core::format_brl;

use super::Layout;
use super::feedback::messages;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::OrderLine;
use crate::services::{OrderHistory, OrderWithLines};
use crate::state::AppState;

/// Store-local offset used for order dates (UTC-3).
const STORE_UTC_OFFSET_SECS: i32 = 3 * 3600;

/// `dd/mm/yyyy, hh:mm` in store-local time.
fn date_label(at: DateTime<Utc>) -> String {
    FixedOffset::west_opt(STORE_UTC_OFFSET_SECS).map_or_else(
        || at.format("%d/%m/%Y, %H:%M").to_string(),
        |offset| at.with_timezone(&offset).format("%d/%m/%Y, %H:%M").to_string(),
    )
}

#[derive(Clone)]
pub struct OrderLineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub total: String,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        Self {
            name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: format_brl(line.unit_price),
            total: format_brl(line.total()),
        }
    }
}

#[derive(Clone)]
pub struct OrderView {
    pub short_id: String,
    pub date: String,
    pub status: String,
    pub total: String,
    pub lines: Vec<OrderLineView>,
}

impl From<&OrderWithLines> for OrderView {
    fn from(entry: &OrderWithLines) -> Self {
        Self {
            short_id: entry.order.short_id(),
            date: date_label(entry.order.created_at),
            status: entry.order.status.as_str().to_string(),
            total: format_brl(entry.order.total),
            lines: entry.lines.iter().map(OrderLineView::from).collect(),
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
    pub error: Option<&'static str>,
}

/// Display the signed-in user's orders, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(session): RequireAuth,
    nonce: CspNonce,
) -> impl IntoResponse {
    let (orders, error) = match OrderHistory::new(state.backend()).history(&session).await {
        Ok(history) => (history.iter().map(OrderView::from).collect(), None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load order history");
            (Vec::new(), Some(messages::ORDERS_FAILED))
        }
    };

    OrdersTemplate {
        layout: Layout::new(nonce, Some(&session)),
        orders,
        error,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_date_label_uses_store_offset() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 2, 30, 0).unwrap();
        assert_eq!(date_label(at), "28/02/2025, 23:30");
    }

    #[test]
    fn test_empty_history_message() {
        let html = OrdersTemplate {
            layout: Layout::new(CspNonce("n".to_string()), None),
            orders: Vec::new(),
            error: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("Você ainda não tem pedidos."));
    }
}

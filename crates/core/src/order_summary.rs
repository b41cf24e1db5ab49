//! Human-readable order summary and the messaging deep link that carries it.
//!
//! After an order is placed the storefront opens a messaging app with the
//! summary prefilled. The link is best-effort: nothing here can fail.

use rust_decimal::Decimal;

use crate::types::{format_brl, line_total};

/// Base URL of the messaging deep link.
pub const MESSAGING_BASE_URL: &str = "https://api.whatsapp.com/send";

/// One product line of the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl SummaryLine {
    #[must_use]
    pub fn total(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

/// The data needed to describe an order to a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub customer_name: String,
    pub customer_email: String,
    pub lines: Vec<SummaryLine>,
}

impl OrderSummary {
    /// Sum of `unit_price × quantity` over every line.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(SummaryLine::total).sum()
    }

    /// Render the message text.
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use stg_catalog_core::{OrderSummary, SummaryLine};
    ///
    /// let summary = OrderSummary {
    ///     customer_name: "Ana".to_string(),
    ///     customer_email: "ana@example.com".to_string(),
    ///     lines: vec![SummaryLine {
    ///         name: "Widget".to_string(),
    ///         quantity: 2,
    ///         unit_price: Decimal::new(1000, 2),
    ///     }],
    /// };
    /// let text = summary.render();
    /// assert!(text.contains("• Widget - Qtd: 2 - R$\u{a0}20,00"));
    /// assert!(text.contains("TOTAL: R$\u{a0}20,00"));
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        let products = self
            .lines
            .iter()
            .map(|line| {
                format!(
                    "• {} - Qtd: {} - {}",
                    line.name,
                    line.quantity,
                    format_brl(line.total())
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "🛍️ NOVO PEDIDO - STG CATALOG\n\
             👤 Cliente: {}\n\
             📧 Email: {}\n\
             🛒 PRODUTOS:\n\
             {}\n\
             💰 TOTAL: {}\n\
             ---\n\
             Pedido via STG Catalog",
            self.customer_name,
            self.customer_email,
            products,
            format_brl(self.total())
        )
    }
}

/// Build the messaging deep link for `text`, addressed to `country_code` + `phone`.
///
/// A missing phone leaves only the country code in the `phone` parameter.
#[must_use]
pub fn messaging_link(country_code: &str, phone: Option<&str>, text: &str) -> String {
    format!(
        "{MESSAGING_BASE_URL}?phone={}{}&text={}",
        urlencoding::encode(country_code),
        urlencoding::encode(phone.unwrap_or_default()),
        urlencoding::encode(text)
    )
}

//! Money arithmetic and display in the storefront's fixed locale.
//!
//! Prices are `rust_decimal::Decimal` values in Brazilian reais. Display
//! follows pt-BR conventions: `R$`, a non-breaking space, `.` as the
//! thousands separator and `,` before exactly two decimals.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol for Brazilian reais.
pub const CURRENCY_SYMBOL: &str = "R$";

/// Non-breaking space placed between the symbol and the amount.
const NBSP: char = '\u{a0}';

/// Price of `quantity` units at `unit_price`.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Format an amount as pt-BR currency, e.g. `R$ 1.234,56`.
///
/// Rounds half away from zero to two decimals.
///
/// ```
/// use rust_decimal::Decimal;
/// use stg_catalog_core::format_brl;
///
/// assert_eq!(format_brl(Decimal::new(2550, 2)), "R$\u{a0}25,50");
/// assert_eq!(format_brl(Decimal::new(123_456_789, 2)), "R$\u{a0}1.234.567,89");
/// ```
#[must_use]
pub fn format_brl(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let mut abs = rounded.abs();
    abs.rescale(2);
    let plain = abs.to_string();
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut out = String::with_capacity(plain.len() + 8);
    if negative {
        out.push('-');
    }
    out.push_str(CURRENCY_SYMBOL);
    out.push(NBSP);
    out.push_str(&group_thousands(int_part));
    out.push(',');
    out.push_str(frac_part);
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

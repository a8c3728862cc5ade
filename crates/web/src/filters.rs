//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Format an amount as a price with two decimals.
///
/// Values that are not numbers are shown unchanged.
#[must_use]
pub fn format_price(amount: &str) -> String {
    amount
        .trim()
        .parse::<Decimal>()
        .map_or_else(|_| amount.to_string(), |value| format!("${value:.2}"))
}

/// Formats a product price.
///
/// Usage in templates: `{{ product.price|money }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_price(&value.to_string()))
}

//! Type-safe price representation using decimal arithmetic.
//!
//! The backend exchanges prices as plain JSON numbers, so both [`Price`] and
//! the raw `Decimal` fields elsewhere in this crate serialize through
//! `rust_decimal::serde::float`.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced when parsing a user-entered price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// Input was blank.
    #[error("price is empty")]
    Empty,
    /// Input was not a number.
    #[error("price is not a number: {0}")]
    NotANumber(String),
    /// Input was zero or negative.
    #[error("price must be greater than 0")]
    NotPositive,
}

/// A strictly positive price in the store's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting zero and negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] if `amount <= 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        Ok(Self(amount))
    }

    /// Parse a price from form input.
    ///
    /// Surrounding whitespace is ignored. Scientific notation (`1e2`) is
    /// accepted the way a numeric form field would accept it.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, not numeric, or not positive.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| PriceError::NotANumber(trimmed.to_string()))?;
        Self::new(amount)
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0.round_dp(2))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Parse a price leniently: blank or unparsable input becomes zero.
///
/// Bulk rows are not price-validated, so they use this instead of
/// [`Price::parse`].
#[must_use]
pub fn parse_lenient(input: &str) -> Decimal {
    let trimmed = input.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_positive_amounts() {
        let price = Price::parse(" 19.99 ").unwrap();
        assert_eq!(price.amount(), Decimal::new(1999, 2));
        assert_eq!(price.to_string(), "19.99");
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert_eq!(Price::parse("0"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("-5"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("0.00"), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(Price::parse("abc"), Err(PriceError::NotANumber(_))));
        assert_eq!(Price::parse("   "), Err(PriceError::Empty));
    }

    #[test]
    fn test_price_serializes_as_json_number() {
        let price = Price::parse("12.5").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "12.5");
    }

    #[test]
    fn test_price_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Price>("0").is_err());
    }

    #[test]
    fn test_parse_lenient_defaults_to_zero() {
        assert_eq!(parse_lenient(""), Decimal::ZERO);
        assert_eq!(parse_lenient("abc"), Decimal::ZERO);
        assert_eq!(parse_lenient("4.25"), Decimal::new(425, 2));
    }
}

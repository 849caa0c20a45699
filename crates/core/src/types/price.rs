//! Menu prices using decimal arithmetic.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors from parsing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price is not a number")]
    NotANumber,
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative menu price in dollars, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rounding half-up to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        ))
    }

    /// Parse user input such as `"24"`, `"24.5"` or `"$1,024.50"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] when the input is not a non-negative number.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let amount = Decimal::from_str(&cleaned).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display with a dollar sign and thousands separators.
    ///
    /// ```
    /// use bistro_core::Price;
    ///
    /// assert_eq!(Price::parse("1234.5").unwrap().display(), "$1,234.50");
    /// ```
    #[must_use]
    pub fn display(&self) -> String {
        let fixed = format!("{:.2}", self.0);
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        format!("${grouped}.{cents}")
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::parse("0").unwrap().display(), "$0.00");
        assert_eq!(Price::parse("9.5").unwrap().display(), "$9.50");
        assert_eq!(Price::parse("999.99").unwrap().display(), "$999.99");
        assert_eq!(Price::parse("1000").unwrap().display(), "$1,000.00");
        assert_eq!(Price::parse("1234567.891").unwrap().display(), "$1,234,567.89");
    }

    #[test]
    fn test_parse_accepts_currency_formatting() {
        assert_eq!(Price::parse("$1,024.50").unwrap().display(), "$1,024.50");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(Price::parse("twelve"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
    }

    #[test]
    fn test_rounds_half_up() {
        assert_eq!(Price::parse("2.005").unwrap().amount().to_string(), "2.01");
    }
}

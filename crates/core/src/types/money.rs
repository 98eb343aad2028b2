//! Money display.
//!
//! Amounts arrive from the backend as plain decimals with no currency. The
//! shop runs in a single currency whose symbol comes from configuration, so
//! formatting only needs the amount and that symbol.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

/// An amount paired with the currency symbol it is shown with.
///
/// ```
/// use rust_decimal::Decimal;
/// use shopfront_core::Money;
///
/// let price = Money::new(Decimal::new(49_950, 2), "₹");
/// assert_eq!(price.to_string(), "₹499.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money<'a> {
    amount: Decimal,
    symbol: &'a str,
}

impl<'a> Money<'a> {
    /// Pair an amount with a currency symbol.
    #[must_use]
    pub const fn new(amount: Decimal, symbol: &'a str) -> Self {
        Self { amount, symbol }
    }

    /// The raw amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }
}

impl fmt::Display for Money<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-{}{:.2}", self.symbol, rounded.abs())
        } else {
            write!(f, "{}{:.2}", self.symbol, rounded.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_two_decimals() {
        assert_eq!(Money::new(Decimal::new(5, 0), "$").to_string(), "$5.00");
        assert_eq!(Money::new(Decimal::new(12_345, 3), "$").to_string(), "$12.35");
    }

    #[test]
    fn test_negative_amount_puts_sign_before_symbol() {
        assert_eq!(Money::new(Decimal::new(-250, 2), "€").to_string(), "-€2.50");
    }
}

//! Rupiah price representation.
//!
//! The bookshop API prices everything in whole rupiah, so the amount
//! is an `i64` rather than a decimal type. Arithmetic beyond what the
//! cart needs (scaling by a quantity, summing line totals) is
//! deliberately not implemented.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Serialize};

/// A price in Indonesian rupiah.
///
/// Serializes as a bare JSON number, matching the wire format of the
/// bookshop API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a price from a rupiah amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// The raw rupiah amount.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Scale the price by a quantity (line total).
    #[must_use]
    pub const fn times(&self, quantity: u32) -> Self {
        Self(self.0 * quantity as i64)
    }

    /// Format for display, e.g. `Rp 1.250.000`.
    ///
    /// Uses the Indonesian convention of `.` as the thousands
    /// separator.
    #[must_use]
    pub fn display(&self) -> String {
        let negative = self.0 < 0;
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        let offset = digits.len() % 3;
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (i + 3 - offset) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        if negative {
            format!("-Rp {grouped}")
        } else {
            format!("Rp {grouped}")
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let lines = [Price::new(10_000).times(2), Price::new(5_000).times(1)];
        let total: Price = lines.into_iter().sum();
        assert_eq!(total, Price::new(25_000));
    }

    #[test]
    fn test_display_grouping() {
        assert_eq!(Price::new(0).display(), "Rp 0");
        assert_eq!(Price::new(999).display(), "Rp 999");
        assert_eq!(Price::new(50_000).display(), "Rp 50.000");
        assert_eq!(Price::new(1_250_000).display(), "Rp 1.250.000");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::new(-1_500).display(), "-Rp 1.500");
    }

    #[test]
    fn test_serde_bare_number() {
        let price: Price = serde_json::from_str("50000").unwrap();
        assert_eq!(price, Price::new(50_000));
        assert_eq!(serde_json::to_string(&price).unwrap(), "50000");
    }
}

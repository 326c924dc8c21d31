//! Integral Toman amounts.
//!
//! Every price, discount and shipping cost in the store is a whole number of
//! Toman, so amounts are plain `i64` underneath. Arithmetic saturates instead
//! of wrapping and never produces a negative total on its own; callers that
//! need a floor at zero use [`Toman::floor_zero`].

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// An amount of money in Toman.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct Toman(i64);

impl Toman {
    /// Zero Toman.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// The raw amount.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self * quantity`, saturating.
    #[must_use]
    pub const fn times(self, quantity: i64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }

    /// `floor(self * percent / 100)`.
    ///
    /// ```
    /// use iranmarket_core::Toman;
    ///
    /// assert_eq!(Toman::new(99_999).percent_of(15), Toman::new(14_999));
    /// ```
    #[must_use]
    pub const fn percent_of(self, percent: i64) -> Self {
        Self(self.0.saturating_mul(percent).div_euclid(100))
    }

    /// Clamp negative amounts to zero.
    #[must_use]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 { Self::ZERO } else { self }
    }

    /// Digits grouped by thousands, without the currency suffix.
    ///
    /// ```
    /// use iranmarket_core::Toman;
    ///
    /// assert_eq!(Toman::new(1_250_000).grouped(), "1,250,000");
    /// assert_eq!(Toman::new(-4_500).grouped(), "-4,500");
    /// ```
    #[must_use]
    pub fn grouped(self) -> String {
        group_thousands(self.0)
    }
}

/// Group an integer's digits by thousands with `,`.
#[must_use]
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Toman {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} تومان", self.grouped())
    }
}

impl From<i64> for Toman {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Toman> for i64 {
    fn from(value: Toman) -> Self {
        value.0
    }
}

impl Add for Toman {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Toman {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Toman {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Toman {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_edges() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(12_345), "12,345");
        assert_eq!(group_thousands(123_456), "123,456");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_display_has_currency() {
        assert_eq!(Toman::new(85_000).to_string(), "85,000 تومان");
    }

    #[test]
    fn test_percent_of_floors() {
        assert_eq!(Toman::new(10_001).percent_of(10), Toman::new(1_000));
        assert_eq!(Toman::new(100).percent_of(100), Toman::new(100));
        assert_eq!(Toman::new(0).percent_of(50), Toman::ZERO);
    }

    #[test]
    fn test_arithmetic_saturates() {
        assert_eq!(Toman::new(i64::MAX) + Toman::new(1), Toman::new(i64::MAX));
        assert_eq!(Toman::new(5).times(3), Toman::new(15));
        assert_eq!((Toman::new(5) - Toman::new(9)).floor_zero(), Toman::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Toman = [Toman::new(1), Toman::new(2), Toman::new(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Toman::new(6));
    }
}

//! Checkout totals.

use serde::{Deserialize, Serialize};

use crate::types::Toman;

/// One cart line priced at checkout time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub unit_price: Toman,
    pub quantity: i32,
}

impl PricedLine {
    #[must_use]
    pub fn total(&self) -> Toman {
        self.unit_price.times(i64::from(self.quantity.max(0)))
    }
}

/// Sum of line totals.
#[must_use]
pub fn items_total<'a, I>(lines: I) -> Toman
where
    I: IntoIterator<Item = &'a PricedLine>,
{
    lines.into_iter().map(PricedLine::total).sum()
}

/// The numbers shown on the checkout page and stored on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub items_total: Toman,
    pub discount: Toman,
    pub shipping: Toman,
    pub payable: Toman,
}

impl CheckoutSummary {
    /// `payable = max(0, items_total - discount + shipping)`.
    ///
    /// ```
    /// use iranmarket_core::checkout::CheckoutSummary;
    /// use iranmarket_core::Toman;
    ///
    /// let s = CheckoutSummary::compute(Toman::new(200_000), Toman::new(20_000), Toman::new(35_000));
    /// assert_eq!(s.payable, Toman::new(215_000));
    /// ```
    #[must_use]
    pub fn compute(items_total: Toman, discount: Toman, shipping: Toman) -> Self {
        let payable = (items_total - discount + shipping).floor_zero();
        Self {
            items_total,
            discount,
            shipping,
            payable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_total() {
        let lines = [
            PricedLine {
                unit_price: Toman::new(12_000),
                quantity: 3,
            },
            PricedLine {
                unit_price: Toman::new(5_500),
                quantity: 2,
            },
        ];
        assert_eq!(items_total(&lines), Toman::new(47_000));
    }

    #[test]
    fn test_negative_quantity_counts_as_zero() {
        let line = PricedLine {
            unit_price: Toman::new(1_000),
            quantity: -2,
        };
        assert_eq!(line.total(), Toman::ZERO);
    }

    #[test]
    fn test_payable_never_negative() {
        let s = CheckoutSummary::compute(Toman::new(10_000), Toman::new(50_000), Toman::ZERO);
        assert_eq!(s.payable, Toman::ZERO);
    }

    #[test]
    fn test_shipping_added_after_discount() {
        let s = CheckoutSummary::compute(Toman::new(100_000), Toman::new(100_000), Toman::new(30_000));
        assert_eq!(s.payable, Toman::new(30_000));
    }
}

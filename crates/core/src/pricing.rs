//! Effective product prices.
//!
//! A product's own `discount_price` wins whenever it is lower than the list
//! price. Only when there is no such discount does an active category-wide
//! percentage apply.

use serde::{Deserialize, Serialize};

use crate::types::Toman;

/// A category-wide discount as configured by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryDiscount {
    pub percent: i32,
    pub active: bool,
}

impl CategoryDiscount {
    /// Percentage to apply, if any.
    #[must_use]
    pub const fn effective_percent(self) -> Option<i32> {
        if self.active && self.percent > 0 {
            Some(if self.percent > 100 { 100 } else { self.percent })
        } else {
            None
        }
    }
}

/// The price inputs of a single product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPricing {
    pub price: Toman,
    pub discount_price: Option<Toman>,
    pub category_discount: CategoryDiscount,
}

impl ProductPricing {
    #[must_use]
    pub const fn new(price: Toman) -> Self {
        Self {
            price,
            discount_price: None,
            category_discount: CategoryDiscount {
                percent: 0,
                active: false,
            },
        }
    }

    #[must_use]
    pub const fn with_discount_price(mut self, discount_price: Option<Toman>) -> Self {
        self.discount_price = discount_price;
        self
    }

    #[must_use]
    pub const fn with_category_discount(mut self, discount: CategoryDiscount) -> Self {
        self.category_discount = discount;
        self
    }

    /// The product's own discount, if it actually lowers the price.
    fn own_discount(&self) -> Option<Toman> {
        self.discount_price.filter(|dp| *dp < self.price)
    }

    /// What the customer pays per unit.
    ///
    /// ```
    /// use iranmarket_core::pricing::{CategoryDiscount, ProductPricing};
    /// use iranmarket_core::Toman;
    ///
    /// let p = ProductPricing::new(Toman::new(50_000)).with_category_discount(CategoryDiscount {
    ///     percent: 15,
    ///     active: true,
    /// });
    /// assert_eq!(p.final_price(), Toman::new(42_500));
    /// ```
    #[must_use]
    pub fn final_price(&self) -> Toman {
        if let Some(dp) = self.own_discount() {
            return dp;
        }
        match self.category_discount.effective_percent() {
            Some(pct) => self.price.percent_of(i64::from(100 - pct)),
            None => self.price,
        }
    }

    /// Whole-number discount percentage shown on badges.
    #[must_use]
    pub fn discount_percent(&self) -> i32 {
        if let Some(dp) = self.own_discount() {
            if self.price.amount() <= 0 {
                return 0;
            }
            // trunc(100 - dp / price * 100) in integer arithmetic
            let off = (self.price.amount() - dp.amount()).saturating_mul(100) / self.price.amount();
            return i32::try_from(off).unwrap_or(100);
        }
        self.category_discount.effective_percent().unwrap_or(0)
    }

    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.final_price() < self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAT_10: CategoryDiscount = CategoryDiscount {
        percent: 10,
        active: true,
    };

    #[test]
    fn test_plain_price() {
        let p = ProductPricing::new(Toman::new(12_000));
        assert_eq!(p.final_price(), Toman::new(12_000));
        assert_eq!(p.discount_percent(), 0);
        assert!(!p.has_discount());
    }

    #[test]
    fn test_product_discount_wins_over_category() {
        let p = ProductPricing::new(Toman::new(100_000))
            .with_discount_price(Some(Toman::new(80_000)))
            .with_category_discount(CAT_10);
        assert_eq!(p.final_price(), Toman::new(80_000));
        assert_eq!(p.discount_percent(), 20);
    }

    #[test]
    fn test_discount_price_not_lower_is_ignored() {
        let p = ProductPricing::new(Toman::new(100_000))
            .with_discount_price(Some(Toman::new(100_000)))
            .with_category_discount(CAT_10);
        assert_eq!(p.final_price(), Toman::new(90_000));
        assert_eq!(p.discount_percent(), 10);
    }

    #[test]
    fn test_inactive_category_discount() {
        let p = ProductPricing::new(Toman::new(100_000)).with_category_discount(CategoryDiscount {
            percent: 30,
            active: false,
        });
        assert_eq!(p.final_price(), Toman::new(100_000));
        assert!(!p.has_discount());
    }

    #[test]
    fn test_category_discount_floors() {
        let p = ProductPricing::new(Toman::new(9_999)).with_category_discount(CategoryDiscount {
            percent: 15,
            active: true,
        });
        // 9999 * 85 / 100 = 8499.15
        assert_eq!(p.final_price(), Toman::new(8_499));
    }

    #[test]
    fn test_percent_truncates() {
        let p = ProductPricing::new(Toman::new(30_000)).with_discount_price(Some(Toman::new(20_000)));
        // 33.33..% shown as 33
        assert_eq!(p.discount_percent(), 33);
    }
}

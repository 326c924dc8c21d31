//! Coupon rules: code normalization, eligibility and discount arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Toman;

/// Codes are compared trimmed and upper-cased.
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Why a coupon cannot be used for this checkout.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponError {
    #[error("کد تخفیف نامعتبر یا منقضی شده است.")]
    Invalid,
    #[error("این کد تخفیف فقط برای اولین سفارش قابل استفاده است.")]
    FirstOrderOnly,
    #[error("حداقل مبلغ سفارش برای این کد تخفیف {min} است.")]
    BelowMinimum { min: Toman },
}

/// The parts of a stored coupon that decide eligibility and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRules {
    pub discount_percent: Option<i32>,
    pub discount_amount: Option<Toman>,
    pub min_order_amount: Toman,
    pub active: bool,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub for_first_order_only: bool,
}

/// Facts about the checkout a coupon is being applied to.
#[derive(Debug, Clone, Copy)]
pub struct CouponContext {
    pub now: DateTime<Utc>,
    pub items_total: Toman,
    /// `None` for guests; first-order coupons are not checked for them.
    pub customer_has_paid_order: Option<bool>,
}

impl CouponRules {
    /// Whether `now` falls inside the validity window and the coupon is on.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && self.valid_from <= now && now <= self.valid_to
    }

    /// Check eligibility and return the discount to apply.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: window/active, first-order-only, then
    /// the minimum order amount.
    pub fn apply(&self, ctx: CouponContext) -> Result<Toman, CouponError> {
        if !self.is_live(ctx.now) {
            return Err(CouponError::Invalid);
        }
        if self.for_first_order_only && ctx.customer_has_paid_order == Some(true) {
            return Err(CouponError::FirstOrderOnly);
        }
        if ctx.items_total < self.min_order_amount {
            return Err(CouponError::BelowMinimum {
                min: self.min_order_amount,
            });
        }
        Ok(self.discount_for(ctx.items_total))
    }

    /// Percent part plus fixed part, never more than `items_total`.
    #[must_use]
    pub fn discount_for(&self, items_total: Toman) -> Toman {
        let items_total = items_total.floor_zero();
        let mut discount = Toman::ZERO;
        if let Some(pct) = self.discount_percent.filter(|p| *p > 0) {
            discount += items_total.percent_of(i64::from(pct.min(100)));
        }
        if let Some(amount) = self.discount_amount {
            discount += amount.floor_zero();
        }
        discount.min(items_total)
    }
}

/// Validation errors for the admin coupon form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponDefinitionError {
    #[error("کد تخفیف الزامی است.")]
    MissingCode,
    #[error("حداقل یکی از درصد یا مبلغ تخفیف باید مشخص شود.")]
    NoDiscount,
    #[error("درصد تخفیف باید بین ۱ تا ۱۰۰ باشد.")]
    PercentOutOfRange,
    #[error("مبلغ تخفیف نمی‌تواند منفی باشد.")]
    NegativeAmount,
    #[error("تاریخ پایان باید بعد از تاریخ شروع باشد.")]
    InvalidWindow,
}

/// A coupon as entered by staff, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponDefinition {
    pub code: String,
    pub rules: CouponRules,
}

impl CouponDefinition {
    /// Normalize the code and check the form-level rules.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponDefinitionError`] found.
    pub fn validate(mut self) -> Result<Self, CouponDefinitionError> {
        self.code = normalize_code(&self.code);
        if self.code.is_empty() {
            return Err(CouponDefinitionError::MissingCode);
        }
        let rules = &self.rules;
        if rules.discount_percent.is_none() && rules.discount_amount.is_none() {
            return Err(CouponDefinitionError::NoDiscount);
        }
        if let Some(pct) = rules.discount_percent
            && !(1..=100).contains(&pct)
        {
            return Err(CouponDefinitionError::PercentOutOfRange);
        }
        if rules.discount_amount.is_some_and(|a| a < Toman::ZERO)
            || rules.min_order_amount < Toman::ZERO
        {
            return Err(CouponDefinitionError::NegativeAmount);
        }
        if rules.valid_from >= rules.valid_to {
            return Err(CouponDefinitionError::InvalidWindow);
        }
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn rules(pct: Option<i32>, amount: Option<i64>) -> CouponRules {
        let now = Utc::now();
        CouponRules {
            discount_percent: pct,
            discount_amount: amount.map(Toman::new),
            min_order_amount: Toman::ZERO,
            active: true,
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(1),
            for_first_order_only: false,
        }
    }

    fn ctx(total: i64) -> CouponContext {
        CouponContext {
            now: Utc::now(),
            items_total: Toman::new(total),
            customer_has_paid_order: None,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  welcome10 "), "WELCOME10");
    }

    #[test]
    fn test_percent_and_amount_stack() {
        let c = rules(Some(10), Some(5_000));
        assert_eq!(c.apply(ctx(200_000)).unwrap(), Toman::new(25_000));
    }

    #[test]
    fn test_discount_never_exceeds_total() {
        let c = rules(Some(100), Some(50_000));
        for total in [0, 1, 999, 40_000, 1_000_000] {
            let discount = c.discount_for(Toman::new(total));
            assert!(discount <= Toman::new(total));
        }
        let fixed = rules(None, Some(80_000));
        assert_eq!(fixed.discount_for(Toman::new(30_000)), Toman::new(30_000));
    }

    #[test]
    fn test_expired_or_inactive_is_invalid() {
        let mut c = rules(Some(10), None);
        c.valid_to = Utc::now() - Duration::hours(1);
        assert_eq!(c.apply(ctx(10_000)), Err(CouponError::Invalid));

        let mut off = rules(Some(10), None);
        off.active = false;
        assert_eq!(off.apply(ctx(10_000)), Err(CouponError::Invalid));
    }

    #[test]
    fn test_first_order_only() {
        let mut c = rules(Some(10), None);
        c.for_first_order_only = true;

        let returning = CouponContext {
            customer_has_paid_order: Some(true),
            ..ctx(10_000)
        };
        assert_eq!(c.apply(returning), Err(CouponError::FirstOrderOnly));

        let first = CouponContext {
            customer_has_paid_order: Some(false),
            ..ctx(10_000)
        };
        assert_eq!(c.apply(first), Ok(Toman::new(1_000)));
        // guests are not checked
        assert_eq!(c.apply(ctx(10_000)), Ok(Toman::new(1_000)));
    }

    #[test]
    fn test_minimum_order_amount() {
        let mut c = rules(None, Some(10_000));
        c.min_order_amount = Toman::new(100_000);
        assert_eq!(
            c.apply(ctx(99_999)),
            Err(CouponError::BelowMinimum {
                min: Toman::new(100_000)
            })
        );
        assert_eq!(c.apply(ctx(100_000)), Ok(Toman::new(10_000)));
    }

    #[test]
    fn test_definition_validation() {
        let def = |pct, amount| CouponDefinition {
            code: " spring ".to_owned(),
            rules: rules(pct, amount),
        };
        assert_eq!(def(Some(20), None).validate().unwrap().code, "SPRING");
        assert_eq!(
            def(None, None).validate(),
            Err(CouponDefinitionError::NoDiscount)
        );
        assert_eq!(
            def(Some(101), None).validate(),
            Err(CouponDefinitionError::PercentOutOfRange)
        );

        let mut backwards = def(Some(5), None);
        backwards.rules.valid_to = backwards.rules.valid_from;
        assert_eq!(
            backwards.validate(),
            Err(CouponDefinitionError::InvalidWindow)
        );
    }
}

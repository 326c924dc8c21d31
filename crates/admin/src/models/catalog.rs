//! Catalog and promotion records as staff edit them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use iranmarket_core::coupon::CouponRules;
use iranmarket_core::{
    BannerId, BannerPosition, BrandId, CategoryId, CouponId, ProductId, ProductUnit, Toman, tz,
};

/// A product row with its category and brand names.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub brand_id: Option<BrandId>,
    pub brand_name: Option<String>,
    pub name: String,
    pub slug: String,
    pub external_code: String,
    pub image: String,
    pub short_description: String,
    pub description: String,
    pub price: Toman,
    pub discount_price: Option<Toman>,
    pub stock: i32,
    pub unit: ProductUnit,
    pub unit_value: Decimal,
    pub is_active: bool,
    pub is_best_seller: bool,
    pub show_in_special_offer: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.stock <= 0
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub icon_image: String,
    pub discount_percent: i32,
    pub discount_active: bool,
    pub is_active: bool,
    pub sort_order: i32,
    /// Products filed under this category.
    pub product_count: i64,
}

#[derive(Debug, Clone)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub logo: String,
    pub product_count: i64,
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub link_url: String,
    pub position: BannerPosition,
    pub is_active: bool,
    pub sort_order: i32,
}

/// A stored coupon with its usage so far.
#[derive(Debug, Clone)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub description: String,
    pub rules: CouponRules,
    pub created_at: DateTime<Utc>,
    /// Orders placed with this coupon.
    pub times_used: i64,
}

impl Coupon {
    /// Whether a customer could use the coupon right now.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.rules.is_live(Utc::now())
    }

    #[must_use]
    pub fn valid_from_local(&self) -> String {
        tz::format_local_date(self.rules.valid_from)
    }

    #[must_use]
    pub fn valid_to_local(&self) -> String {
        tz::format_local_date(self.rules.valid_to)
    }

    /// `10٪ + 5,000 تومان` style summary for the list page.
    #[must_use]
    pub fn discount_summary(&self) -> String {
        let percent = self.rules.discount_percent.map(|p| format!("{p}٪"));
        let amount = self
            .rules
            .discount_amount
            .map(|a| format!("{} تومان", a.grouped()));
        match (percent, amount) {
            (Some(p), Some(a)) => format!("{p} + {a}"),
            (Some(p), None) => p,
            (None, Some(a)) => a,
            (None, None) => "-".to_owned(),
        }
    }
}

// =============================================================================
// Form input
// =============================================================================

/// Product fields as submitted by the edit form, already parsed.
///
/// An empty `slug` is derived from the name.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub brand_id: Option<BrandId>,
    pub name: String,
    pub slug: String,
    pub external_code: String,
    pub image: String,
    pub short_description: String,
    pub description: String,
    pub price: Toman,
    pub discount_price: Option<Toman>,
    pub stock: i32,
    pub unit: ProductUnit,
    pub unit_value: Decimal,
    pub is_active: bool,
    pub is_best_seller: bool,
    pub show_in_special_offer: bool,
}

#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub icon_image: String,
    pub discount_percent: i32,
    pub discount_active: bool,
    pub is_active: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct BrandInput {
    pub name: String,
    pub slug: String,
    pub logo: String,
}

#[derive(Debug, Clone)]
pub struct BannerInput {
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub link_url: String,
    pub position: BannerPosition,
    pub is_active: bool,
    pub sort_order: i32,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn coupon(percent: Option<i32>, amount: Option<i64>) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            code: "NOROOZ".to_owned(),
            description: String::new(),
            rules: CouponRules {
                discount_percent: percent,
                discount_amount: amount.map(Toman::new),
                min_order_amount: Toman::ZERO,
                active: true,
                valid_from: now,
                valid_to: now + Duration::days(7),
                for_first_order_only: false,
            },
            created_at: now,
            times_used: 0,
        }
    }

    #[test]
    fn test_discount_summary() {
        assert_eq!(coupon(Some(10), None).discount_summary(), "10٪");
        assert_eq!(
            coupon(Some(10), Some(5_000)).discount_summary(),
            "10٪ + 5,000 تومان"
        );
        assert_eq!(coupon(None, Some(20_000)).discount_summary(), "20,000 تومان");
    }
}

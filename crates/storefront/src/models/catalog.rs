//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use iranmarket_core::pricing::{CategoryDiscount, ProductPricing};
use iranmarket_core::{
    BannerId, BannerPosition, BrandId, CategoryId, ProductId, ProductUnit, ReviewId, Toman, UserId,
};

/// A product category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub icon_image: String,
    pub discount: CategoryDiscount,
    pub is_active: bool,
    pub sort_order: i32,
}

/// A product brand.
#[derive(Debug, Clone)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub logo: String,
}

/// A promotional banner.
#[derive(Debug, Clone)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub link_url: String,
    pub position: BannerPosition,
}

/// An active product with its category and brand names.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub category_slug: String,
    pub brand_id: Option<BrandId>,
    pub brand_name: Option<String>,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub short_description: String,
    pub description: String,
    pub price: Toman,
    pub discount_price: Option<Toman>,
    pub category_discount: CategoryDiscount,
    pub stock: i32,
    pub unit: ProductUnit,
    pub unit_value: Decimal,
    pub is_best_seller: bool,
    pub show_in_special_offer: bool,
    pub rating: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price rules for this product.
    #[must_use]
    pub const fn pricing(&self) -> ProductPricing {
        ProductPricing::new(self.price)
            .with_discount_price(self.discount_price)
            .with_category_discount(self.category_discount)
    }

    /// What the customer pays per unit.
    #[must_use]
    pub fn final_price(&self) -> Toman {
        self.pricing().final_price()
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.pricing().has_discount()
    }

    #[must_use]
    pub fn discount_percent(&self) -> i32 {
        self.pricing().discount_percent()
    }

    /// "1.5 کیلوگرم"; trailing zeros of the amount are dropped.
    #[must_use]
    pub fn unit_label(&self) -> String {
        format!("{} {}", self.unit_value.normalize(), self.unit.label())
    }

    /// Meta description: short description, else the start of the long one.
    #[must_use]
    pub fn seo_description(&self) -> String {
        let base = if self.short_description.is_empty() {
            self.description.chars().take(150).collect::<String>()
        } else {
            self.short_description.clone()
        };
        if base.is_empty() {
            format!("خرید آنلاین «{}» با قیمت مناسب و ارسال سریع از ایران مارکت.", self.name)
        } else {
            format!("{base} خرید آنلاین «{}» با ارسال سریع از ایران مارکت.", self.name)
        }
    }
}

impl Review {
    #[must_use]
    pub fn created_local(&self) -> String {
        iranmarket_core::tz::format_local_date(self.created_at)
    }
}

impl ReviewStats {
    /// Average for display, e.g. "4.5".
    #[must_use]
    pub fn average_label(&self) -> String {
        self.average
            .map(|avg| avg.normalize().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(short: &str, description: &str) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(1),
            category_name: "لبنیات".to_owned(),
            category_slug: "لبنیات".to_owned(),
            brand_id: None,
            brand_name: None,
            name: "شیر".to_owned(),
            slug: "شیر".to_owned(),
            image: String::new(),
            short_description: short.to_owned(),
            description: description.to_owned(),
            price: Toman::new(40_000),
            discount_price: Some(Toman::new(30_000)),
            category_discount: CategoryDiscount::default(),
            stock: 3,
            unit: ProductUnit::Liter,
            unit_value: Decimal::new(150, 2),
            is_best_seller: false,
            show_in_special_offer: false,
            rating: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unit_label_drops_trailing_zeros() {
        assert_eq!(product("", "").unit_label(), "1.5 لیتر");
    }

    #[test]
    fn test_discount_helpers() {
        let p = product("", "");
        assert!(p.has_discount());
        assert_eq!(p.discount_percent(), 25);
        assert_eq!(p.final_price(), Toman::new(30_000));
    }

    #[test]
    fn test_seo_description_fallbacks() {
        assert!(product("تازه", "").seo_description().starts_with("تازه خرید آنلاین"));
        let long = "ا".repeat(400);
        let from_long = product("", &long).seo_description();
        assert!(from_long.starts_with(&"ا".repeat(150)));
        assert!(!from_long.starts_with(&"ا".repeat(151)));
        assert!(product("", "").seo_description().starts_with("خرید آنلاین «شیر»"));
    }
}

/// Approved review aggregate for a product.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewStats {
    pub average: Option<Decimal>,
    pub count: i64,
}

/// A customer review.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Profile name, falling back to the username.
    pub author: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

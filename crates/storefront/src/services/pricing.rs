//! Cart pricing against the live catalog.

use sqlx::PgPool;

use iranmarket_core::checkout::{PricedLine, items_total};
use iranmarket_core::location::CityWithZone;
use iranmarket_core::shipping::shipping_cost;
use iranmarket_core::{ProductId, Toman};

use crate::cart::Cart;
use crate::db::RepositoryError;
use crate::db::catalog::CatalogRepository;
use crate::models::Product;

/// A cart line with its product and current price.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub priced: PricedLine,
}

impl CartLine {
    #[must_use]
    pub const fn quantity(&self) -> i32 {
        self.priced.quantity
    }

    #[must_use]
    pub const fn unit_price(&self) -> Toman {
        self.priced.unit_price
    }

    #[must_use]
    pub fn total(&self) -> Toman {
        self.priced.total()
    }
}

/// The priced cart in the order lines were added.
#[derive(Debug, Clone, Default)]
pub struct PricedCart {
    pub lines: Vec<CartLine>,
    pub items_total: Toman,
}

impl PricedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Match cart entries to products. Entries without a product are skipped.
#[must_use]
pub fn price_lines(cart: &Cart, products: &[Product]) -> PricedCart {
    let lines: Vec<CartLine> = cart
        .entries()
        .iter()
        .filter_map(|entry| {
            let product = products.iter().find(|p| p.id == entry.product_id)?;
            Some(CartLine {
                priced: PricedLine {
                    unit_price: product.final_price(),
                    quantity: entry.quantity,
                },
                product: product.clone(),
            })
        })
        .collect();
    let items_total = items_total(lines.iter().map(|l| &l.priced));

    PricedCart { lines, items_total }
}

/// Shipping for the cart going to the visitor's current city.
#[must_use]
pub fn shipping_for(city: Option<&CityWithZone>, items_total: Toman) -> Toman {
    let destination = city.map(CityWithZone::destination);
    shipping_cost(destination.as_ref(), items_total)
}

/// Price the cart, dropping entries whose product is gone or deactivated.
///
/// Returns `true` alongside the priced cart when entries were dropped, so the
/// caller can write the cleaned cart back to the session.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the catalog query fails.
pub async fn price_cart(
    pool: &PgPool,
    cart: &mut Cart,
) -> Result<(PricedCart, bool), RepositoryError> {
    if cart.is_empty() {
        return Ok((PricedCart::default(), false));
    }
    let products = CatalogRepository::new(pool)
        .active_products(&cart.product_ids())
        .await?;

    let before = cart.entries().len();
    let available: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    cart.retain_products(&available);

    Ok((price_lines(cart, &products), cart.entries().len() != before))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use iranmarket_core::location::City;
    use iranmarket_core::pricing::CategoryDiscount;
    use iranmarket_core::shipping::ZoneRate;
    use iranmarket_core::{CategoryId, CityId, ProductUnit, ProvinceId};

    use super::*;

    fn product(id: i32, price: i64, discount_price: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            category_name: "لبنیات".to_owned(),
            category_slug: "لبنیات".to_owned(),
            brand_id: None,
            brand_name: None,
            name: format!("کالا {id}"),
            slug: format!("p-{id}"),
            image: String::new(),
            short_description: String::new(),
            description: String::new(),
            price: Toman::new(price),
            discount_price: discount_price.map(Toman::new),
            category_discount: CategoryDiscount {
                percent: 0,
                active: false,
            },
            stock: 10,
            unit: ProductUnit::Piece,
            unit_value: Decimal::ONE,
            is_best_seller: false,
            show_in_special_offer: false,
            rating: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_lines_uses_effective_price() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(2), 1);
        let products = vec![product(2, 30_000, None), product(1, 50_000, Some(40_000))];

        let priced = price_lines(&cart, &products);
        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines.first().map(|l| l.product.id), Some(ProductId::new(1)));
        assert_eq!(priced.lines.first().map(CartLine::total), Some(Toman::new(80_000)));
        assert_eq!(priced.items_total, Toman::new(110_000));
    }

    #[test]
    fn test_price_lines_skips_unknown_products() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(9), 1);
        let priced = price_lines(&cart, &[product(1, 10_000, None)]);
        assert!(priced.is_empty());
        assert_eq!(priced.items_total, Toman::ZERO);
    }

    #[test]
    fn test_shipping_for_current_city() {
        let tehran = CityWithZone {
            city: City {
                id: CityId::new(1),
                province_id: ProvinceId::new(1),
                name: "تهران".to_owned(),
                slug: "تهران-تهران".to_owned(),
                sort_order: 0,
                is_active: true,
                is_popular: true,
                delivery_available: true,
                shipping_zone_id: None,
            },
            province_name: "تهران".to_owned(),
            zone: Some(ZoneRate {
                base_shipping_cost: Toman::new(45_000),
                free_shipping_threshold: Some(Toman::new(500_000)),
                is_active: true,
            }),
        };
        assert_eq!(shipping_for(Some(&tehran), Toman::new(100_000)), Toman::new(45_000));
        assert_eq!(shipping_for(Some(&tehran), Toman::new(500_000)), Toman::ZERO);
        assert_eq!(shipping_for(None, Toman::new(100_000)), Toman::ZERO);
    }
}

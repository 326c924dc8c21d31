//! Catalog reads: categories, brands, banners and product listings.
//!
//! Listings filter and sort on the effective price, computed in SQL with the
//! same rule as [`iranmarket_core::pricing::ProductPricing::final_price`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use iranmarket_core::pricing::CategoryDiscount;
use iranmarket_core::{
    BannerId, BannerPosition, BrandId, CategoryId, ProductId, ProductUnit, Toman,
};

use super::{RepositoryError, like_pattern};
use crate::listing::{ListingFilter, PAGE_SIZE, Page, SortOrder};
use crate::models::{Banner, Brand, Category, Product};

/// Products shown per home page section.
pub const HOME_SECTION_SIZE: i64 = 12;

/// Effective unit price: product discount, then category discount, then list price.
pub(crate) const FINAL_PRICE_SQL: &str = "CASE \
     WHEN p.discount_price IS NOT NULL AND p.discount_price < p.price THEN p.discount_price \
     WHEN c.discount_active AND c.discount_percent > 0 \
         THEN (p.price * (100 - c.discount_percent)) / 100 \
     ELSE p.price END";

/// True when the effective price is below the list price.
const HAS_DISCOUNT_SQL: &str = "((p.discount_price IS NOT NULL AND p.discount_price < p.price) \
     OR (c.discount_active AND c.discount_percent > 0))";

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.category_id, c.name AS category_name, \
     c.slug AS category_slug, p.brand_id, b.name AS brand_name, p.name, p.slug, p.image, \
     p.short_description, p.description, p.price, p.discount_price, \
     c.discount_percent AS category_discount_percent, \
     c.discount_active AS category_discount_active, p.stock, p.unit, p.unit_value, \
     p.is_best_seller, p.show_in_special_offer, p.rating, p.created_at";

pub(crate) const PRODUCT_FROM: &str = " FROM shop.product p \
     JOIN shop.category c ON c.id = p.category_id \
     LEFT JOIN shop.brand b ON b.id = p.brand_id";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    icon_image: String,
    discount_percent: i32,
    discount_active: bool,
    is_active: bool,
    sort_order: i32,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            icon_image: row.icon_image,
            discount: CategoryDiscount {
                percent: row.discount_percent,
                active: row.discount_active,
            },
            is_active: row.is_active,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: BrandId,
    name: String,
    slug: String,
    logo: String,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            logo: row.logo,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BannerRow {
    id: BannerId,
    title: String,
    subtitle: String,
    image: String,
    link_url: String,
    position: BannerPosition,
}

impl From<BannerRow> for Banner {
    fn from(row: BannerRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            image: row.image,
            link_url: row.link_url,
            position: row.position,
        }
    }
}

/// A product joined with its category and brand.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    category_id: CategoryId,
    category_name: String,
    category_slug: String,
    brand_id: Option<BrandId>,
    brand_name: Option<String>,
    name: String,
    slug: String,
    image: String,
    short_description: String,
    description: String,
    price: Toman,
    discount_price: Option<Toman>,
    category_discount_percent: i32,
    category_discount_active: bool,
    stock: i32,
    unit: ProductUnit,
    unit_value: Decimal,
    is_best_seller: bool,
    show_in_special_offer: bool,
    rating: Decimal,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            category_name: row.category_name,
            category_slug: row.category_slug,
            brand_id: row.brand_id,
            brand_name: row.brand_name,
            name: row.name,
            slug: row.slug,
            image: row.image,
            short_description: row.short_description,
            description: row.description,
            price: row.price,
            discount_price: row.discount_price,
            category_discount: CategoryDiscount {
                percent: row.category_discount_percent,
                active: row.category_discount_active,
            },
            stock: row.stock,
            unit: row.unit,
            unit_value: row.unit_value,
            is_best_seller: row.is_best_seller,
            show_in_special_offer: row.show_in_special_offer,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Listing Scopes
// =============================================================================

/// Which products a listing page starts from, before filters.
#[derive(Debug, Clone, Copy)]
pub enum ListingScope<'a> {
    /// Every active product.
    All,
    Category(CategoryId),
    /// Discounted or flagged as special offer.
    Offers,
    Newest,
    BestSellers,
    /// Discounted products only (home page section).
    Discounted,
    /// Name, descriptions, category and brand names.
    Search(&'a str),
}

fn push_conditions(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: ListingScope<'_>,
    filter: &ListingFilter,
) {
    qb.push(" WHERE p.is_active");

    match scope {
        ListingScope::Category(id) => {
            qb.push(" AND p.category_id = ").push_bind(id);
        }
        ListingScope::Offers => {
            qb.push(" AND (p.show_in_special_offer OR ")
                .push(HAS_DISCOUNT_SQL)
                .push(")");
        }
        ListingScope::Discounted => {
            qb.push(" AND ").push(HAS_DISCOUNT_SQL);
        }
        ListingScope::BestSellers => {
            qb.push(" AND p.is_best_seller");
        }
        ListingScope::All | ListingScope::Newest => {}
        ListingScope::Search(term) => {
            let pattern = like_pattern(term);
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.short_description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR b.name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    if let Some(brand) = filter.brand {
        qb.push(" AND p.brand_id = ").push_bind(brand);
    }
    if filter.only_discount {
        qb.push(" AND ").push(HAS_DISCOUNT_SQL);
    }
    if filter.in_stock {
        qb.push(" AND p.stock > 0");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND (")
            .push(FINAL_PRICE_SQL)
            .push(") >= ")
            .push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND (")
            .push(FINAL_PRICE_SQL)
            .push(") <= ")
            .push_bind(max);
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only catalog queries.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active categories in menu order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, icon_image, discount_percent, discount_active,
                   is_active, sort_order
            FROM shop.category
            WHERE is_active
            ORDER BY sort_order, name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// An active category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, icon_image, discount_percent, discount_active,
                   is_active, sort_order
            FROM shop.category
            WHERE slug = $1 AND is_active
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Brands with at least one active product in the category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands_in_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, BrandRow>(
            r"
            SELECT DISTINCT b.id, b.name, b.slug, b.logo
            FROM shop.brand b
            JOIN shop.product p ON p.brand_id = b.id
            WHERE p.category_id = $1 AND p.is_active
            ORDER BY b.name
            ",
        )
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Brand::from).collect())
    }

    /// Active banners for one slot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn banners(&self, position: BannerPosition) -> Result<Vec<Banner>, RepositoryError> {
        let rows = sqlx::query_as::<_, BannerRow>(
            r"
            SELECT id, title, subtitle, image, link_url, position
            FROM shop.banner
            WHERE is_active AND position = $1
            ORDER BY sort_order, id
            ",
        )
        .bind(position)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Banner::from).collect())
    }

    /// One page of a filtered listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        scope: ListingScope<'_>,
        filter: &ListingFilter,
        requested_page: Option<&str>,
    ) -> Result<(Vec<Product>, Page), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(PRODUCT_FROM);
        push_conditions(&mut count, scope, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let page = Page::resolve(requested_page, total);
        let products = self
            .fetch(scope, filter, filter.sort, PAGE_SIZE, page.offset())
            .await?;

        Ok((products, page))
    }

    /// First `limit` products of a scope, for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn section(
        &self,
        scope: ListingScope<'_>,
        sort: SortOrder,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.fetch(scope, &ListingFilter::default(), sort, limit, 0)
            .await
    }

    async fn fetch(
        &self,
        scope: ListingScope<'_>,
        filter: &ListingFilter,
        sort: SortOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(PRODUCT_COLUMNS)
            .push(", ")
            .push(FINAL_PRICE_SQL)
            .push(" AS final_price")
            .push(PRODUCT_FROM);
        push_conditions(&mut qb, scope, filter);
        qb.push(" ORDER BY ")
            .push(sort.sql())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// An active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS}{PRODUCT_FROM} WHERE p.slug = $1 AND p.is_active");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// An active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS}{PRODUCT_FROM} WHERE p.id = $1 AND p.is_active");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Active products among `ids`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}{PRODUCT_FROM} WHERE p.id = ANY($1) AND p.is_active"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(raw)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(scope: ListingScope<'_>, filter: &ListingFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(PRODUCT_FROM);
        push_conditions(&mut qb, scope, filter);
        qb.sql().to_owned()
    }

    #[test]
    fn test_price_bounds_use_effective_price() {
        let filter = ListingFilter {
            min_price: Some(Toman::new(1_000)),
            max_price: Some(Toman::new(5_000)),
            ..ListingFilter::default()
        };
        let sql = conditions(ListingScope::Newest, &filter);
        assert!(sql.contains(&format!("({FINAL_PRICE_SQL}) >= $1")));
        assert!(sql.contains(&format!("({FINAL_PRICE_SQL}) <= $2")));
    }

    #[test]
    fn test_search_binds_every_field() {
        let sql = conditions(ListingScope::Search("شیر"), &ListingFilter::default());
        for field in ["p.name", "p.short_description", "p.description", "c.name", "b.name"] {
            assert!(sql.contains(&format!("{field} ILIKE")), "missing {field}");
        }
        assert!(sql.contains("$5"));
    }

    #[test]
    fn test_filters_append_in_order() {
        let filter = ListingFilter {
            brand: Some(BrandId::new(3)),
            only_discount: true,
            in_stock: true,
            ..ListingFilter::default()
        };
        let sql = conditions(ListingScope::Category(CategoryId::new(1)), &filter);
        assert!(sql.contains("p.category_id = $1"));
        assert!(sql.contains("p.brand_id = $2"));
        assert!(sql.contains(HAS_DISCOUNT_SQL));
        assert!(sql.ends_with("AND p.stock > 0"));
    }
}

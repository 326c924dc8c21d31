//! Products, categories and brands.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use iranmarket_core::{BrandId, CategoryId, ProductId, ProductUnit, Toman, slugify};

use super::{RepositoryError, SlugTable, free_slug, from_foreign_key, like_pattern};
use crate::models::{Brand, BrandInput, Category, CategoryInput, Product, ProductInput};

/// Filters of the product list page.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub query: Option<String>,
    pub category_id: Option<CategoryId>,
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    category_id: CategoryId,
    category_name: String,
    brand_id: Option<BrandId>,
    brand_name: Option<String>,
    name: String,
    slug: String,
    external_code: String,
    image: String,
    short_description: String,
    description: String,
    price: Toman,
    discount_price: Option<Toman>,
    stock: i32,
    unit: ProductUnit,
    unit_value: Decimal,
    is_active: bool,
    is_best_seller: bool,
    show_in_special_offer: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            category_name: row.category_name,
            brand_id: row.brand_id,
            brand_name: row.brand_name,
            name: row.name,
            slug: row.slug,
            external_code: row.external_code,
            image: row.image,
            short_description: row.short_description,
            description: row.description,
            price: row.price,
            discount_price: row.discount_price,
            stock: row.stock,
            unit: row.unit,
            unit_value: row.unit_value,
            is_active: row.is_active,
            is_best_seller: row.is_best_seller,
            show_in_special_offer: row.show_in_special_offer,
            created_at: row.created_at,
        }
    }
}

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
    product_count: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            icon_image: row.icon_image,
            discount_percent: row.discount_percent,
            discount_active: row.discount_active,
            is_active: row.is_active,
            sort_order: row.sort_order,
            product_count: row.product_count,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: BrandId,
    name: String,
    slug: String,
    logo: String,
    product_count: i64,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            logo: row.logo,
            product_count: row.product_count,
        }
    }
}

const PRODUCT_SELECT: &str = "SELECT p.id, p.category_id, c.name AS category_name, p.brand_id, \
     b.name AS brand_name, p.name, p.slug, p.external_code, p.image, p.short_description, \
     p.description, p.price, p.discount_price, p.stock, p.unit, p.unit_value, p.is_active, \
     p.is_best_seller, p.show_in_special_offer, p.created_at \
     FROM shop.product p \
     JOIN shop.category c ON c.id = p.category_id \
     LEFT JOIN shop.brand b ON b.id = p.brand_id";

const CATEGORY_SELECT: &str = "SELECT c.id, c.name, c.slug, c.icon_image, c.discount_percent, \
     c.discount_active, c.is_active, c.sort_order, \
     (SELECT COUNT(*) FROM shop.product p WHERE p.category_id = c.id) AS product_count \
     FROM shop.category c";

const BRAND_SELECT: &str = "SELECT b.id, b.name, b.slug, b.logo, \
     (SELECT COUNT(*) FROM shop.product p WHERE p.brand_id = b.id) AS product_count \
     FROM shop.brand b";

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog management.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// One page of products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(PRODUCT_SELECT);
        push_product_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Number of products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_products(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM shop.product p JOIN shop.category c ON c.id = p.category_id \
             LEFT JOIN shop.brand b ON b.id = p.brand_id",
        );
        push_product_filter(&mut qb, filter);
        Ok(qb.build_query_scalar::<i64>().fetch_one(self.pool).await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Insert a product, deriving a free slug when none was given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let slug = self
            .slug_for(SlugTable::Product, &input.slug, &input.name, None)
            .await?;
        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO shop.product
                (category_id, brand_id, name, slug, external_code, image, short_description,
                 description, price, discount_price, stock, unit, unit_value, is_active,
                 is_best_seller, show_in_special_offer)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id
            ",
        )
        .bind(input.category_id)
        .bind(input.brand_id)
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.external_code)
        .bind(&input.image)
        .bind(&input.short_description)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.stock)
        .bind(input.unit)
        .bind(input.unit_value)
        .bind(input.is_active)
        .bind(input.is_best_seller)
        .bind(input.show_in_special_offer)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product slug"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), RepositoryError> {
        let slug = self
            .slug_for(SlugTable::Product, &input.slug, &input.name, Some(id.as_i32()))
            .await?;
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET category_id = $2, brand_id = $3, name = $4, slug = $5, external_code = $6,
                image = $7, short_description = $8, description = $9, price = $10,
                discount_price = $11, stock = $12, unit = $13, unit_value = $14,
                is_active = $15, is_best_seller = $16, show_in_special_offer = $17,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(input.brand_id)
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.external_code)
        .bind(&input.image)
        .bind(&input.short_description)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.stock)
        .bind(input.unit)
        .bind(input.unit_value)
        .bind(input.is_active)
        .bind(input.is_best_seller)
        .bind(input.show_in_special_offer)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product. Products that appear on orders cannot be deleted;
    /// deactivate them instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if an order references it.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| from_foreign_key(e, "product"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!("{CATEGORY_SELECT} ORDER BY c.sort_order, c.name");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("{CATEGORY_SELECT} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create_category(
        &self,
        input: &CategoryInput,
    ) -> Result<CategoryId, RepositoryError> {
        let slug = self
            .slug_for(SlugTable::Category, &input.slug, &input.name, None)
            .await?;
        let id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO shop.category
                (name, slug, icon_image, discount_percent, discount_active, is_active, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.icon_image)
        .bind(input.discount_percent)
        .bind(input.discount_active)
        .bind(input.is_active)
        .bind(input.sort_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category slug"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<(), RepositoryError> {
        let slug = self
            .slug_for(SlugTable::Category, &input.slug, &input.name, Some(id.as_i32()))
            .await?;
        let result = sqlx::query(
            r"
            UPDATE shop.category
            SET name = $2, slug = $3, icon_image = $4, discount_percent = $5,
                discount_active = $6, is_active = $7, sort_order = $8
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.icon_image)
        .bind(input.discount_percent)
        .bind(input.discount_active)
        .bind(input.is_active)
        .bind(input.sort_order)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Brands
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let sql = format!("{BRAND_SELECT} ORDER BY b.name");
        let rows = sqlx::query_as::<_, BrandRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brand(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let sql = format!("{BRAND_SELECT} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BrandRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create_brand(&self, input: &BrandInput) -> Result<BrandId, RepositoryError> {
        let slug = self
            .slug_for(SlugTable::Brand, &input.slug, &input.name, None)
            .await?;
        let id: BrandId = sqlx::query_scalar(
            "INSERT INTO shop.brand (name, slug, logo) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.logo)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "brand slug"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_brand(&self, id: BrandId, input: &BrandInput) -> Result<(), RepositoryError> {
        let slug = self
            .slug_for(SlugTable::Brand, &input.slug, &input.name, Some(id.as_i32()))
            .await?;
        let result =
            sqlx::query("UPDATE shop.brand SET name = $2, slug = $3, logo = $4 WHERE id = $1")
                .bind(id)
                .bind(&input.name)
                .bind(&slug)
                .bind(&input.logo)
                .execute(self.pool)
                .await
                .map_err(|e| RepositoryError::from_unique(e, "brand slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Slugs
    // -------------------------------------------------------------------------

    /// The slug to store: the one typed in, or a free one derived from the name.
    async fn slug_for(
        &self,
        table: SlugTable,
        requested: &str,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<String, RepositoryError> {
        let requested = requested.trim();
        if !requested.is_empty() {
            return Ok(slugify(requested));
        }
        free_slug(self.pool, table, &slugify(name), exclude_id).await
    }
}

fn push_product_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(category_id) = filter.category_id {
        qb.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(query);
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.external_code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR b.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_filter_sql() {
        let filter = ProductFilter {
            query: Some(" برنج ".to_owned()),
            category_id: Some(CategoryId::new(3)),
        };
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT 1 FROM x");
        push_product_filter(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("p.category_id = $1"));
        assert!(sql.contains("p.name ILIKE $2"));
        assert!(sql.contains("b.name ILIKE $4"));
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let filter = ProductFilter {
            query: Some("   ".to_owned()),
            category_id: None,
        };
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT 1 FROM x");
        push_product_filter(&mut qb, &filter);
        assert_eq!(qb.sql(), "SELECT 1 FROM x WHERE TRUE");
    }
}

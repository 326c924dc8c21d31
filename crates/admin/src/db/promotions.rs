//! Banners and coupons.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use iranmarket_core::coupon::{CouponDefinition, CouponRules};
use iranmarket_core::{BannerId, BannerPosition, CouponId, Toman};

use super::RepositoryError;
use crate::models::{Banner, BannerInput, Coupon};

#[derive(Debug, sqlx::FromRow)]
struct BannerRow {
    id: BannerId,
    title: String,
    subtitle: String,
    image: String,
    link_url: String,
    position: BannerPosition,
    is_active: bool,
    sort_order: i32,
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
            is_active: row.is_active,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    code: String,
    description: String,
    discount_percent: Option<i32>,
    discount_amount: Option<Toman>,
    min_order_amount: Toman,
    active: bool,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    for_first_order_only: bool,
    created_at: DateTime<Utc>,
    times_used: i64,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            description: row.description,
            rules: CouponRules {
                discount_percent: row.discount_percent,
                discount_amount: row.discount_amount,
                min_order_amount: row.min_order_amount,
                active: row.active,
                valid_from: row.valid_from,
                valid_to: row.valid_to,
                for_first_order_only: row.for_first_order_only,
            },
            created_at: row.created_at,
            times_used: row.times_used,
        }
    }
}

const BANNER_COLUMNS: &str =
    "id, title, subtitle, image, link_url, position, is_active, sort_order";

const COUPON_SELECT: &str = "SELECT c.id, c.code, c.description, c.discount_percent, \
     c.discount_amount, c.min_order_amount, c.active, c.valid_from, c.valid_to, \
     c.for_first_order_only, c.created_at, \
     (SELECT COUNT(*) FROM shop.orders o WHERE o.coupon_id = c.id) AS times_used \
     FROM shop.coupon c";

/// Repository for banners and coupons.
pub struct PromotionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromotionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -------------------------------------------------------------------------
    // Banners
    // -------------------------------------------------------------------------

    /// All banners grouped by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn banners(&self) -> Result<Vec<Banner>, RepositoryError> {
        let sql = format!("SELECT {BANNER_COLUMNS} FROM shop.banner ORDER BY position, sort_order, id");
        let rows = sqlx::query_as::<_, BannerRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn banner(&self, id: BannerId) -> Result<Option<Banner>, RepositoryError> {
        let sql = format!("SELECT {BANNER_COLUMNS} FROM shop.banner WHERE id = $1");
        let row = sqlx::query_as::<_, BannerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_banner(&self, input: &BannerInput) -> Result<BannerId, RepositoryError> {
        let id: BannerId = sqlx::query_scalar(
            r"
            INSERT INTO shop.banner (title, subtitle, image, link_url, position, is_active, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image)
        .bind(&input.link_url)
        .bind(input.position)
        .bind(input.is_active)
        .bind(input.sort_order)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner does not exist.
    pub async fn update_banner(
        &self,
        id: BannerId,
        input: &BannerInput,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.banner
            SET title = $2, subtitle = $3, image = $4, link_url = $5, position = $6,
                is_active = $7, sort_order = $8
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image)
        .bind(&input.link_url)
        .bind(input.position)
        .bind(input.is_active)
        .bind(input.sort_order)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner does not exist.
    pub async fn delete_banner(&self, id: BannerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.banner WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Coupons
    // -------------------------------------------------------------------------

    /// All coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn coupons(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let sql = format!("{COUPON_SELECT} ORDER BY c.created_at DESC, c.id DESC");
        let rows = sqlx::query_as::<_, CouponRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn coupon(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let sql = format!("{COUPON_SELECT} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CouponRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Store a validated coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create_coupon(
        &self,
        coupon: &CouponDefinition,
        description: &str,
    ) -> Result<CouponId, RepositoryError> {
        let rules = &coupon.rules;
        let id: CouponId = sqlx::query_scalar(
            r"
            INSERT INTO shop.coupon
                (code, description, discount_percent, discount_amount, min_order_amount, active,
                 valid_from, valid_to, for_first_order_only)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(&coupon.code)
        .bind(description)
        .bind(rules.discount_percent)
        .bind(rules.discount_amount)
        .bind(rules.min_order_amount)
        .bind(rules.active)
        .bind(rules.valid_from)
        .bind(rules.valid_to)
        .bind(rules.for_first_order_only)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "coupon code"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon does not exist.
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn update_coupon(
        &self,
        id: CouponId,
        coupon: &CouponDefinition,
        description: &str,
    ) -> Result<(), RepositoryError> {
        let rules = &coupon.rules;
        let result = sqlx::query(
            r"
            UPDATE shop.coupon
            SET code = $2, description = $3, discount_percent = $4, discount_amount = $5,
                min_order_amount = $6, active = $7, valid_from = $8, valid_to = $9,
                for_first_order_only = $10
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&coupon.code)
        .bind(description)
        .bind(rules.discount_percent)
        .bind(rules.discount_amount)
        .bind(rules.min_order_amount)
        .bind(rules.active)
        .bind(rules.valid_from)
        .bind(rules.valid_to)
        .bind(rules.for_first_order_only)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "coupon code"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

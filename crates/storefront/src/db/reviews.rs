//! Product reviews.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use iranmarket_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::{Review, ReviewStats};

const REVIEW_SELECT: &str = r"
    SELECT r.id, r.product_id, r.user_id,
           COALESCE(NULLIF(pr.full_name, ''), u.username) AS author,
           r.rating, r.title, r.comment, r.is_approved, r.created_at
    FROM shop.review r
    JOIN shop.user_account u ON u.id = r.user_id
    LEFT JOIN shop.user_profile pr ON pr.user_id = r.user_id
";

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    author: String,
    rating: i16,
    title: String,
    comment: String,
    is_approved: bool,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            author: row.author,
            rating: row.rating,
            title: row.title,
            comment: row.comment,
            is_approved: row.is_approved,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    average: Option<Decimal>,
    count: i64,
}

/// A review as submitted from the product page.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    /// 1..=5.
    pub rating: i16,
    pub title: String,
    pub comment: String,
}

/// Repository for review operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Average rating (one decimal) and count of approved reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self, product_id: ProductId) -> Result<ReviewStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT ROUND(AVG(rating)::NUMERIC, 1) AS average, COUNT(*) AS count
            FROM shop.review
            WHERE product_id = $1 AND is_approved
            ",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(ReviewStats {
            average: row.average,
            count: row.count,
        })
    }

    /// Approved reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn approved_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let sql = format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 AND r.is_approved ORDER BY r.created_at DESC"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// The customer's own review of a product, approved or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_user(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("{REVIEW_SELECT} WHERE r.product_id = $1 AND r.user_id = $2");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(product_id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Review::from))
    }

    /// Create or replace the customer's review. Returns `true` when created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        product_id: ProductId,
        user_id: UserId,
        input: &ReviewInput,
    ) -> Result<bool, RepositoryError> {
        let created: bool = sqlx::query_scalar(
            r"
            INSERT INTO shop.review (product_id, user_id, rating, title, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (product_id, user_id) DO UPDATE
            SET rating = EXCLUDED.rating,
                title = EXCLUDED.title,
                comment = EXCLUDED.comment,
                updated_at = NOW()
            RETURNING (xmax = 0) AS created
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(input.rating)
        .bind(&input.title)
        .bind(&input.comment)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }
}

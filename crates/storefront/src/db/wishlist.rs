//! Wishlists.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use iranmarket_core::{ProductId, UserId};

use super::RepositoryError;
use super::catalog::{PRODUCT_COLUMNS, PRODUCT_FROM, ProductRow};
use crate::models::{Product, WishlistEntry};

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    #[sqlx(flatten)]
    product: ProductRow,
    added_at: DateTime<Utc>,
}

/// Repository for wishlist operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Wishlisted active products, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}, w.created_at AS added_at{PRODUCT_FROM} \
             JOIN shop.wishlist_item w ON w.product_id = p.id \
             WHERE w.user_id = $1 AND p.is_active \
             ORDER BY w.created_at DESC"
        );
        let rows = sqlx::query_as::<_, WishlistRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| WishlistEntry {
                product: Product::from(row.product),
                added_at: row.added_at,
            })
            .collect())
    }

    /// Whether the product is on the customer's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let found: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM shop.wishlist_item WHERE user_id = $1 AND product_id = $2
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(found)
    }

    /// Add a product; adding twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.wishlist_item (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove a product if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.wishlist_item WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

//! Sales figures for the dashboard. Only paid orders count as sales.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use iranmarket_core::{ProductId, Toman};

use super::RepositoryError;

/// Tehran calendar date of `o.created_at`, matching [`iranmarket_core::tz`].
const LOCAL_DATE_SQL: &str = "(o.created_at AT TIME ZONE 'UTC' + INTERVAL '3 hours 30 minutes')::date";

/// Order totals regardless of status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderCounts {
    pub total: i64,
    pub paid: i64,
    pub unpaid: i64,
}

/// Revenue and distinct order count over some window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct SalesTotals {
    pub revenue: Toman,
    pub orders: i64,
}

/// Sales of one Tehran calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct DailySales {
    pub day: NaiveDate,
    pub revenue: Toman,
    pub orders: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub units: i64,
    pub revenue: Toman,
}

/// A delivery city ranked by the revenue of orders shipped there.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopCity {
    pub name: String,
    pub province_name: String,
    pub revenue: Toman,
    pub orders: i64,
}

/// Rows in each top-N table.
pub const TOP_LIMIT: i64 = 10;

/// Repository for dashboard aggregates.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_counts(&self) -> Result<OrderCounts, RepositoryError> {
        Ok(sqlx::query_as::<_, OrderCounts>(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE paid) AS paid,
                   COUNT(*) FILTER (WHERE NOT paid) AS unpaid
            FROM shop.orders
            ",
        )
        .fetch_one(self.pool)
        .await?)
    }

    /// Σ price × quantity and distinct paid orders created in `[from, to)`.
    /// Both bounds open when `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_between(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<SalesTotals, RepositoryError> {
        Ok(sqlx::query_as::<_, SalesTotals>(
            r"
            SELECT COALESCE(SUM(oi.price * oi.quantity), 0)::BIGINT AS revenue,
                   COUNT(DISTINCT o.id) AS orders
            FROM shop.orders o
            LEFT JOIN shop.order_item oi ON oi.order_id = o.id
            WHERE o.paid
              AND ($1::TIMESTAMPTZ IS NULL OR o.created_at >= $1)
              AND ($2::TIMESTAMPTZ IS NULL OR o.created_at < $2)
            ",
        )
        .bind(from)
        .bind(to)
        .fetch_one(self.pool)
        .await?)
    }

    /// Per-day sales since `from`, only for days that had sales.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn daily_sales_since(
        &self,
        from: DateTime<Utc>,
    ) -> Result<Vec<DailySales>, RepositoryError> {
        let sql = format!(
            "SELECT {LOCAL_DATE_SQL} AS day, \
                    COALESCE(SUM(oi.price * oi.quantity), 0)::BIGINT AS revenue, \
                    COUNT(DISTINCT o.id) AS orders \
             FROM shop.orders o \
             LEFT JOIN shop.order_item oi ON oi.order_id = o.id \
             WHERE o.paid AND o.created_at >= $1 \
             GROUP BY day \
             ORDER BY day"
        );
        Ok(sqlx::query_as::<_, DailySales>(&sql)
            .bind(from)
            .fetch_all(self.pool)
            .await?)
    }

    /// Best selling products by revenue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(&self) -> Result<Vec<TopProduct>, RepositoryError> {
        Ok(sqlx::query_as::<_, TopProduct>(
            r"
            SELECT p.id, p.name,
                   SUM(oi.quantity)::BIGINT AS units,
                   SUM(oi.price * oi.quantity)::BIGINT AS revenue
            FROM shop.order_item oi
            JOIN shop.orders o ON o.id = oi.order_id
            JOIN shop.product p ON p.id = oi.product_id
            WHERE o.paid
            GROUP BY p.id, p.name
            ORDER BY revenue DESC, units DESC
            LIMIT $1
            ",
        )
        .bind(TOP_LIMIT)
        .fetch_all(self.pool)
        .await?)
    }

    /// Cities by revenue, using the city each order was shipped to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_cities(&self) -> Result<Vec<TopCity>, RepositoryError> {
        Ok(sqlx::query_as::<_, TopCity>(
            r"
            SELECT c.name, pr.name AS province_name,
                   SUM(oi.price * oi.quantity)::BIGINT AS revenue,
                   COUNT(DISTINCT o.id) AS orders
            FROM shop.orders o
            JOIN shop.order_item oi ON oi.order_id = o.id
            JOIN shop.city c ON c.id = o.city_id
            JOIN shop.province pr ON pr.id = c.province_id
            WHERE o.paid
            GROUP BY c.id, c.name, pr.name
            ORDER BY revenue DESC
            LIMIT $1
            ",
        )
        .bind(TOP_LIMIT)
        .fetch_all(self.pool)
        .await?)
    }
}

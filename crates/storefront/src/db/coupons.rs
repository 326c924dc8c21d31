//! Coupon lookup for checkout.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use iranmarket_core::coupon::{CouponRules, normalize_code};
use iranmarket_core::{CouponId, Toman};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    code: String,
    discount_percent: Option<i32>,
    discount_amount: Option<Toman>,
    min_order_amount: Toman,
    active: bool,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    for_first_order_only: bool,
}

/// A stored coupon: its identity plus the rules that price it.
#[derive(Debug, Clone)]
pub struct StoredCoupon {
    pub id: CouponId,
    pub code: String,
    pub rules: CouponRules,
}

impl From<CouponRow> for StoredCoupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            rules: CouponRules {
                discount_percent: row.discount_percent,
                discount_amount: row.discount_amount,
                min_order_amount: row.min_order_amount,
                active: row.active,
                valid_from: row.valid_from,
                valid_to: row.valid_to,
                for_first_order_only: row.for_first_order_only,
            },
        }
    }
}

/// Repository for coupon lookups.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by code, ignoring case and surrounding spaces.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_code(&self, raw_code: &str) -> Result<Option<StoredCoupon>, RepositoryError> {
        let code = normalize_code(raw_code);
        if code.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount_percent, discount_amount, min_order_amount, active,
                   valid_from, valid_to, for_first_order_only
            FROM shop.coupon
            WHERE UPPER(code) = $1
            ",
        )
        .bind(&code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(StoredCoupon::from))
    }
}

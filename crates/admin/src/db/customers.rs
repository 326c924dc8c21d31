//! Customer accounts and login codes, read-only.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use iranmarket_core::{Toman, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::{Customer, LoginCode};

/// Rows shown per customer page.
pub const CUSTOMER_PAGE_SIZE: i64 = 50;

/// Login codes shown on the OTP page.
pub const RECENT_CODES_LIMIT: i64 = 100;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: UserId,
    username: String,
    full_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    is_active: bool,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    order_count: i64,
    paid_total: Toman,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            full_name: row.full_name.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            is_active: row.is_active,
            date_joined: row.date_joined,
            last_login: row.last_login,
            order_count: row.order_count,
            paid_total: row.paid_total,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LoginCodeRow {
    identifier: String,
    code: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    is_used: bool,
    attempts: i32,
}

impl From<LoginCodeRow> for LoginCode {
    fn from(row: LoginCodeRow) -> Self {
        Self {
            identifier: row.identifier,
            code: row.code,
            created_at: row.created_at,
            expires_at: row.expires_at,
            is_used: row.is_used,
            attempts: row.attempts,
        }
    }
}

/// Repository for customer lookups.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest customers, optionally matching username, name, phone or email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        query: Option<&str>,
        offset: i64,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let pattern = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(like_pattern);
        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT u.id, u.username, pr.full_name, pr.phone,
                   COALESCE(NULLIF(pr.email, ''), u.email) AS email,
                   u.is_active, u.date_joined, u.last_login,
                   (SELECT COUNT(*) FROM shop.orders o WHERE o.user_id = u.id) AS order_count,
                   (SELECT COALESCE(SUM(o.total_price), 0)::BIGINT
                      FROM shop.orders o WHERE o.user_id = u.id AND o.paid) AS paid_total
            FROM shop.user_account u
            LEFT JOIN shop.user_profile pr ON pr.user_id = u.id
            WHERE $1::TEXT IS NULL
               OR u.username ILIKE $1
               OR pr.full_name ILIKE $1
               OR pr.phone ILIKE $1
               OR u.email ILIKE $1
            ORDER BY u.date_joined DESC, u.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(pattern)
        .bind(CUSTOMER_PAGE_SIZE)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Most recent login codes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_login_codes(&self) -> Result<Vec<LoginCode>, RepositoryError> {
        let rows = sqlx::query_as::<_, LoginCodeRow>(
            r"
            SELECT identifier, code, created_at, expires_at, is_used, attempts
            FROM shop.login_otp
            ORDER BY created_at DESC
            LIMIT $1
            ",
        )
        .bind(RECENT_CODES_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

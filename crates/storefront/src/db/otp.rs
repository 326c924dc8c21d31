//! Login code storage.
//!
//! Only the most recent unused code for an identifier is ever checked.
//! Requesting a new code does not invalidate older ones; they simply stop
//! being the latest.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use iranmarket_core::OtpId;
use iranmarket_core::otp::{OtpOutcome, OtpRecord};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct OtpRow {
    id: OtpId,
    code: String,
    expires_at: DateTime<Utc>,
    attempts: i32,
}

/// Repository for one-time login codes.
pub struct OtpRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OtpRepository<'a> {
    /// Create a new OTP repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        identifier: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO shop.login_otp (identifier, code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(identifier)
        .bind(code)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Check `submitted` against the latest unused code for `identifier` and
    /// record the result, all under a row lock.
    ///
    /// Concurrent guesses against the same code are serialized: the second
    /// one re-reads the row after the first commits, so a code is accepted at
    /// most once and every wrong guess is counted. Returns `None` when there
    /// is no unused code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn attempt(
        &self,
        identifier: &str,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpOutcome>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OtpRow>(
            r"
            SELECT id, code, expires_at, attempts
            FROM shop.login_otp
            WHERE identifier = $1 AND NOT is_used
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            FOR UPDATE
            ",
        )
        .bind(identifier)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let record = OtpRecord {
            code: row.code,
            expires_at: row.expires_at,
            attempts: row.attempts,
        };
        let outcome = record.check(submitted, now);

        let update = if outcome.burns_code() {
            "UPDATE shop.login_otp SET is_used = TRUE WHERE id = $1"
        } else {
            "UPDATE shop.login_otp SET attempts = attempts + 1 WHERE id = $1"
        };
        sqlx::query(update).bind(row.id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(Some(outcome))
    }
}

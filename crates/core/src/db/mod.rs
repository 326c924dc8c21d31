//! Shared `PostgreSQL` access for the storefront, admin and CLI.
//!
//! Only the repositories both binaries need live here: the order lifecycle
//! (payment, cancellation, status changes), locations and site settings.
//! Everything else stays in the binary that owns the page.
//!
//! All tables are in the `shop` schema; migrations live in
//! `crates/storefront/migrations/`.

pub mod locations;
pub mod orders;
pub mod settings;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::order::PaymentError;

pub use locations::LocationRepository;
pub use orders::{CancelOutcome, OrderRepository, PaymentOutcome};
pub use settings::SiteSettingRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Entity not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Payment rules rejected the operation.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl RepositoryError {
    /// Map unique violations to [`RepositoryError::Conflict`], everything else
    /// to [`RepositoryError::Database`].
    #[must_use]
    pub fn from_unique(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Escape `%`, `_` and `\` and wrap in `%` for `ILIKE`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" برنج "), "%برنج%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}

//! Database operations for admin.
//!
//! The panel shares the store database. Order lifecycle, locations and
//! site settings come from [`iranmarket_core::db`]; the staff-only
//! repositories live here.
//!
//! # Tables
//!
//! - `admin.admin_user` - Staff accounts (argon2 password hashes)
//! - `admin.session` - Admin session storage
//! - `shop.*` - Everything the staff manage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p iranmarket-cli -- migrate admin
//! ```

pub mod admin_users;
pub mod catalog;
pub mod customers;
pub mod locations;
pub mod moderation;
pub mod promotions;
pub mod reports;

use std::collections::HashSet;

use sqlx::PgPool;

use iranmarket_core::unique_slug;

pub use iranmarket_core::db::{
    CancelOutcome, LocationRepository, OrderRepository, PaymentOutcome, RepositoryError,
    SiteSettingRepository, create_pool, like_pattern,
};

pub use admin_users::AdminUserRepository;
pub use catalog::CatalogRepository;
pub use customers::CustomerRepository;
pub use locations::LocationAdminRepository;
pub use moderation::ModerationRepository;
pub use promotions::PromotionRepository;
pub use reports::ReportRepository;

/// Map a foreign key violation to [`RepositoryError::Conflict`].
pub(crate) fn from_foreign_key(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(format!("{what} is still referenced"));
    }
    RepositoryError::Database(e)
}

/// Tables whose rows carry a unique `slug`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SlugTable {
    Product,
    Category,
    Brand,
    Province,
    City,
}

impl SlugTable {
    const fn name(self) -> &'static str {
        match self {
            Self::Product => "shop.product",
            Self::Category => "shop.category",
            Self::Brand => "shop.brand",
            Self::Province => "shop.province",
            Self::City => "shop.city",
        }
    }
}

/// First free slug derived from `base` (`base`, `base-2`, ...), ignoring the
/// row being edited.
pub(crate) async fn free_slug(
    pool: &PgPool,
    table: SlugTable,
    base: &str,
    exclude_id: Option<i32>,
) -> Result<String, RepositoryError> {
    let base = if base.is_empty() { "item" } else { base };
    let sql = format!(
        "SELECT slug FROM {} WHERE (slug = $1 OR slug LIKE $2) AND id IS DISTINCT FROM $3",
        table.name()
    );
    let taken: HashSet<String> = sqlx::query_scalar::<_, String>(&sql)
        .bind(base)
        .bind(format!("{}-%", escape_like(base)))
        .bind(exclude_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();
    Ok(unique_slug(base, |candidate| taken.contains(candidate)))
}

/// Escape `LIKE` wildcards without wrapping in `%`.
fn escape_like(term: &str) -> String {
    let wrapped = like_pattern(term);
    wrapped
        .strip_prefix('%')
        .and_then(|s| s.strip_suffix('%'))
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("rice"), "rice");
    }

    #[test]
    fn test_slug_tables() {
        assert_eq!(SlugTable::Province.name(), "shop.province");
        assert_eq!(SlugTable::City.name(), "shop.city");
    }
}

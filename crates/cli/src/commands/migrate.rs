//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront database (falls back to `DATABASE_URL`)
//! - `ADMIN_DATABASE_URL` - admin database (falls back to `DATABASE_URL`)
//!
//! Both migration sets may target the same database. They share the
//! `_sqlx_migrations` table, so each run ignores versions applied by the
//! other set.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use thiserror::Error;

use super::database_url;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront (`shop` schema) migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the connection fails, or a
/// migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    run(
        "storefront",
        "STOREFRONT_DATABASE_URL",
        sqlx::migrate!("../storefront/migrations"),
    )
    .await
}

/// Run admin (`admin` schema) migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the connection fails, or a
/// migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    run(
        "admin",
        "ADMIN_DATABASE_URL",
        sqlx::migrate!("../admin/migrations"),
    )
    .await
}

async fn run(
    target: &str,
    env_var: &'static str,
    mut migrator: Migrator,
) -> Result<(), MigrationError> {
    let url = database_url(env_var).ok_or(MigrationError::MissingEnvVar(env_var))?;

    tracing::info!("Connecting to {target} database...");
    let pool = PgPool::connect(&url).await?;

    migrator.set_ignore_missing(true);

    tracing::info!(count = migrator.iter().count(), "Running {target} migrations...");
    migrator.run(&pool).await?;

    tracing::info!("{target} migrations complete");
    Ok(())
}

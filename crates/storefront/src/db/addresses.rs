//! Saved delivery addresses.
//!
//! At most one address per customer is the default; setting a new default
//! clears the others in the same transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use iranmarket_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::Address;

const ADDRESS_COLUMNS: &str = "id, user_id, label, city, district, street, plaque, \
     postal_code, latitude, longitude, is_default, created_at";

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: String,
    city: String,
    district: String,
    street: String,
    plaque: String,
    postal_code: String,
    latitude: Option<Decimal>,
    longitude: Option<Decimal>,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            city: row.city,
            district: row.district,
            street: row.street,
            plaque: row.plaque,
            postal_code: row.postal_code,
            latitude: row.latitude,
            longitude: row.longitude,
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

/// Address form fields.
#[derive(Debug, Clone, Default)]
pub struct AddressInput {
    pub label: String,
    pub city: String,
    pub district: String,
    pub street: String,
    pub plaque: String,
    pub postal_code: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub is_default: bool,
}

/// Repository for address operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The customer's addresses, default first, then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address WHERE user_id = $1 \
             ORDER BY is_default DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// One of the customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let sql =
            format!("SELECT {ADDRESS_COLUMNS} FROM shop.address WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Address::from))
    }

    /// Create an address, or update `id` when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if `id` is not the customer's.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(
        &self,
        user_id: UserId,
        id: Option<AddressId>,
        input: &AddressInput,
    ) -> Result<AddressId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let saved: Option<AddressId> = match id {
            Some(id) => {
                sqlx::query_scalar(
                    r"
                    UPDATE shop.address
                    SET label = $3, city = $4, district = $5, street = $6, plaque = $7,
                        postal_code = $8, latitude = $9, longitude = $10, is_default = $11
                    WHERE id = $1 AND user_id = $2
                    RETURNING id
                    ",
                )
                .bind(id)
                .bind(user_id)
                .bind(&input.label)
                .bind(&input.city)
                .bind(&input.district)
                .bind(&input.street)
                .bind(&input.plaque)
                .bind(&input.postal_code)
                .bind(input.latitude)
                .bind(input.longitude)
                .bind(input.is_default)
                .fetch_optional(&mut *tx)
                .await?
            }
            None => Some(
                sqlx::query_scalar(
                    r"
                    INSERT INTO shop.address
                        (user_id, label, city, district, street, plaque, postal_code,
                         latitude, longitude, is_default)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    RETURNING id
                    ",
                )
                .bind(user_id)
                .bind(&input.label)
                .bind(&input.city)
                .bind(&input.district)
                .bind(&input.street)
                .bind(&input.plaque)
                .bind(&input.postal_code)
                .bind(input.latitude)
                .bind(input.longitude)
                .bind(input.is_default)
                .fetch_one(&mut *tx)
                .await?,
            ),
        };

        let saved = saved.ok_or(RepositoryError::NotFound)?;
        if input.is_default {
            clear_other_defaults(&mut tx, user_id, saved).await?;
        }

        tx.commit().await?;
        Ok(saved)
    }

    /// Make `id` the default address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if `id` is not the customer's.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE shop.address SET is_default = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        clear_other_defaults(&mut tx, user_id, id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete one of the customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if `id` is not the customer's.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

async fn clear_other_defaults(
    conn: &mut PgConnection,
    user_id: UserId,
    keep: AddressId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.address SET is_default = FALSE WHERE user_id = $1 AND id <> $2")
        .bind(user_id)
        .bind(keep)
        .execute(conn)
        .await?;
    Ok(())
}

//! Customer accounts and profiles.
//!
//! Accounts are created on first successful OTP login; the username is the
//! phone number or email the customer typed.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use iranmarket_core::{CityId, UserId};

use super::RepositoryError;
use crate::models::{Profile, UserAccount};

const PROFILE_COLUMNS: &str = "user_id, full_name, phone, email, date_of_birth, \
     current_city_id, notify_order_sms, notify_promotions, notify_site_notifications";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    email: Option<String>,
    is_active: bool,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            is_active: row.is_active,
            date_joined: row.date_joined,
            last_login: row.last_login,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: UserId,
    full_name: String,
    phone: String,
    email: String,
    date_of_birth: Option<NaiveDate>,
    current_city_id: Option<CityId>,
    notify_order_sms: bool,
    notify_promotions: bool,
    notify_site_notifications: bool,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: row.user_id,
            full_name: row.full_name,
            phone: row.phone,
            email: row.email,
            date_of_birth: row.date_of_birth,
            current_city_id: row.current_city_id,
            notify_order_sms: row.notify_order_sms,
            notify_promotions: row.notify_promotions,
            notify_site_notifications: row.notify_site_notifications,
        }
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Notification switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationPrefs {
    pub order_sms: bool,
    pub promotions: bool,
    pub site_notifications: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer accounts and profiles.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the account for `username` or create it, then stamp `last_login`.
    ///
    /// `email` is only written when the account is created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn login(
        &self,
        username: &str,
        email: Option<&str>,
    ) -> Result<UserAccount, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.user_account (username, email, last_login)
            VALUES ($1, $2, NOW())
            ON CONFLICT (username) DO UPDATE SET last_login = NOW()
            RETURNING id, username, email, is_active, date_joined, last_login
            ",
        )
        .bind(username)
        .bind(email)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get an account by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, is_active, date_joined, last_login
            FROM shop.user_account
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(UserAccount::from))
    }

    /// The profile for `user`, created with the login phone/email on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn profile(&self, user: &UserAccount) -> Result<Profile, RepositoryError> {
        let phone = if user.username.contains('@') {
            ""
        } else {
            user.username.as_str()
        };
        sqlx::query(
            r"
            INSERT INTO shop.user_profile (user_id, phone, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user.id)
        .bind(phone)
        .bind(user.email.as_deref().unwrap_or_default())
        .execute(self.pool)
        .await?;

        let sql = format!("SELECT {PROFILE_COLUMNS} FROM shop.user_profile WHERE user_id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user.id)
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Save the profile form. The account email follows the profile email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            UPDATE shop.user_profile
            SET full_name = $2, email = $3, date_of_birth = $4
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(update.date_of_birth)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE shop.user_account SET email = NULLIF($2, '') WHERE id = $1")
            .bind(user_id)
            .bind(&update.email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// The city saved on the customer's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn current_city_id(&self, user_id: UserId) -> Result<Option<CityId>, RepositoryError> {
        let city: Option<Option<CityId>> = sqlx::query_scalar(
            "SELECT current_city_id FROM shop.user_profile WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(city.flatten())
    }

    /// Remember the delivery city picked in the header.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_current_city(
        &self,
        user_id: UserId,
        city_id: CityId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.user_profile SET current_city_id = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(city_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Save the notification switches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_notifications(
        &self,
        user_id: UserId,
        prefs: NotificationPrefs,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE shop.user_profile
            SET notify_order_sms = $2, notify_promotions = $3, notify_site_notifications = $4
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(prefs.order_sms)
        .bind(prefs.promotions)
        .bind(prefs.site_notifications)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

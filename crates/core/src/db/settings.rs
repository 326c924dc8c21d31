//! The single-row site settings table.

use sqlx::PgPool;

use super::RepositoryError;
use crate::settings::SiteSettings;

#[derive(Debug, sqlx::FromRow)]
struct SiteSettingRow {
    store_name: String,
    intro_text: String,
    phone: String,
    address: String,
    whatsapp_link: String,
    instagram_link: String,
    delivery_description: String,
}

impl From<SiteSettingRow> for SiteSettings {
    fn from(row: SiteSettingRow) -> Self {
        Self {
            store_name: row.store_name,
            intro_text: row.intro_text,
            phone: row.phone,
            address: row.address,
            whatsapp_link: row.whatsapp_link,
            instagram_link: row.instagram_link,
            delivery_description: row.delivery_description,
        }
    }
}

pub struct SiteSettingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SiteSettingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The stored settings, or defaults when staff never saved any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_default(&self) -> Result<SiteSettings, RepositoryError> {
        let row = sqlx::query_as::<_, SiteSettingRow>(
            r"
            SELECT store_name, intro_text, phone, address, whatsapp_link,
                   instagram_link, delivery_description
            FROM shop.site_setting
            WHERE id = 1
            ",
        )
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into).unwrap_or_default())
    }

    /// Replace the settings row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn save(&self, settings: &SiteSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.site_setting
                (id, store_name, intro_text, phone, address, whatsapp_link,
                 instagram_link, delivery_description, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (id) DO UPDATE
                SET store_name = EXCLUDED.store_name,
                    intro_text = EXCLUDED.intro_text,
                    phone = EXCLUDED.phone,
                    address = EXCLUDED.address,
                    whatsapp_link = EXCLUDED.whatsapp_link,
                    instagram_link = EXCLUDED.instagram_link,
                    delivery_description = EXCLUDED.delivery_description,
                    updated_at = NOW()
            ",
        )
        .bind(&settings.store_name)
        .bind(&settings.intro_text)
        .bind(&settings.phone)
        .bind(&settings.address)
        .bind(&settings.whatsapp_link)
        .bind(&settings.instagram_link)
        .bind(&settings.delivery_description)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

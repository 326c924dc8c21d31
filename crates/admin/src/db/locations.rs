//! Province, city and shipping zone editing.
//!
//! Read-only lookups shared with the storefront come from
//! [`iranmarket_core::db::LocationRepository`].

use sqlx::PgPool;

use iranmarket_core::location::{City, Province, ShippingZone};
use iranmarket_core::{CityId, ProvinceId, ShippingZoneId, Toman, city_slug, slugify};

use super::{RepositoryError, SlugTable, free_slug};

/// A city with the names of its province and zone, for the city list.
#[derive(Debug, Clone)]
pub struct CityListing {
    pub city: City,
    pub province_name: String,
    pub zone_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProvinceInput {
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct CityInput {
    pub province_id: ProvinceId,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub is_popular: bool,
    pub delivery_available: bool,
    pub shipping_zone_id: Option<ShippingZoneId>,
}

#[derive(Debug, Clone)]
pub struct ZoneInput {
    pub name: String,
    pub base_shipping_cost: Toman,
    pub free_shipping_threshold: Option<Toman>,
    pub is_active: bool,
    pub sort_order: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct CityListingRow {
    id: CityId,
    province_id: ProvinceId,
    name: String,
    slug: String,
    sort_order: i32,
    is_active: bool,
    is_popular: bool,
    delivery_available: bool,
    shipping_zone_id: Option<ShippingZoneId>,
    province_name: String,
    zone_name: Option<String>,
}

impl From<CityListingRow> for CityListing {
    fn from(row: CityListingRow) -> Self {
        Self {
            city: City {
                id: row.id,
                province_id: row.province_id,
                name: row.name,
                slug: row.slug,
                sort_order: row.sort_order,
                is_active: row.is_active,
                is_popular: row.is_popular,
                delivery_available: row.delivery_available,
                shipping_zone_id: row.shipping_zone_id,
            },
            province_name: row.province_name,
            zone_name: row.zone_name,
        }
    }
}

const CITY_LISTING_SELECT: &str = "SELECT c.id, c.province_id, c.name, c.slug, c.sort_order, \
     c.is_active, c.is_popular, c.delivery_available, c.shipping_zone_id, \
     p.name AS province_name, z.name AS zone_name \
     FROM shop.city c \
     JOIN shop.province p ON p.id = c.province_id \
     LEFT JOIN shop.shipping_zone z ON z.id = c.shipping_zone_id";

/// Repository for location management.
pub struct LocationAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LocationAdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -------------------------------------------------------------------------
    // Provinces
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn province(&self, id: ProvinceId) -> Result<Option<Province>, RepositoryError> {
        let row: Option<(ProvinceId, String, String, i32, bool)> = sqlx::query_as(
            "SELECT id, name, slug, sort_order, is_active FROM shop.province WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|(id, name, slug, sort_order, is_active)| Province {
            id,
            name,
            slug,
            sort_order,
            is_active,
        }))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create_province(
        &self,
        input: &ProvinceInput,
    ) -> Result<ProvinceId, RepositoryError> {
        let slug = self.province_slug(input, None).await?;
        let id: ProvinceId = sqlx::query_scalar(
            r"
            INSERT INTO shop.province (name, slug, sort_order, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(&slug)
        .bind(input.sort_order)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "province slug"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the province does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_province(
        &self,
        id: ProvinceId,
        input: &ProvinceInput,
    ) -> Result<(), RepositoryError> {
        let slug = self.province_slug(input, Some(id)).await?;
        let result = sqlx::query(
            "UPDATE shop.province SET name = $2, slug = $3, sort_order = $4, is_active = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&slug)
        .bind(input.sort_order)
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "province slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// The typed slug, or a free one derived from the name.
    async fn province_slug(
        &self,
        input: &ProvinceInput,
        editing: Option<ProvinceId>,
    ) -> Result<String, RepositoryError> {
        if let Some(slug) = requested_slug(&input.slug) {
            return Ok(slug);
        }
        let exclude = editing.map(|id| id.as_i32());
        free_slug(self.pool, SlugTable::Province, &slugify(&input.name), exclude).await
    }

    // -------------------------------------------------------------------------
    // Cities
    // -------------------------------------------------------------------------

    /// Cities ordered by province, optionally limited to one province.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cities(
        &self,
        province_id: Option<ProvinceId>,
    ) -> Result<Vec<CityListing>, RepositoryError> {
        let sql = format!(
            "{CITY_LISTING_SELECT} WHERE ($1::INTEGER IS NULL OR c.province_id = $1) \
             ORDER BY p.sort_order, p.name, c.sort_order, c.name"
        );
        let rows = sqlx::query_as::<_, CityListingRow>(&sql)
            .bind(province_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn city(&self, id: CityId) -> Result<Option<CityListing>, RepositoryError> {
        let sql = format!("{CITY_LISTING_SELECT} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CityListingRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the province does not exist.
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    pub async fn create_city(&self, input: &CityInput) -> Result<CityId, RepositoryError> {
        let slug = self.city_slug(input, None).await?;
        let id: CityId = sqlx::query_scalar(
            r"
            INSERT INTO shop.city
                (province_id, name, slug, sort_order, is_active, is_popular,
                 delivery_available, shipping_zone_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(input.province_id)
        .bind(&input.name)
        .bind(&slug)
        .bind(input.sort_order)
        .bind(input.is_active)
        .bind(input.is_popular)
        .bind(input.delivery_available)
        .bind(input.shipping_zone_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "city"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the city or province does not exist.
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    pub async fn update_city(&self, id: CityId, input: &CityInput) -> Result<(), RepositoryError> {
        let slug = self.city_slug(input, Some(id)).await?;
        let result = sqlx::query(
            r"
            UPDATE shop.city
            SET province_id = $2, name = $3, slug = $4, sort_order = $5, is_active = $6,
                is_popular = $7, delivery_available = $8, shipping_zone_id = $9
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.province_id)
        .bind(&input.name)
        .bind(&slug)
        .bind(input.sort_order)
        .bind(input.is_active)
        .bind(input.is_popular)
        .bind(input.delivery_available)
        .bind(input.shipping_zone_id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "city"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// The typed slug, or a free one derived from `<province>-<city>`.
    async fn city_slug(
        &self,
        input: &CityInput,
        editing: Option<CityId>,
    ) -> Result<String, RepositoryError> {
        if let Some(slug) = requested_slug(&input.slug) {
            return Ok(slug);
        }
        let province = self
            .province(input.province_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let base = city_slug(&province.name, &input.name);
        let exclude = editing.map(|id| id.as_i32());
        free_slug(self.pool, SlugTable::City, &base, exclude).await
    }

    // -------------------------------------------------------------------------
    // Shipping zones
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn zone(&self, id: ShippingZoneId) -> Result<Option<ShippingZone>, RepositoryError> {
        let row: Option<(ShippingZoneId, String, Toman, Option<Toman>, bool, i32)> =
            sqlx::query_as(
                r"
                SELECT id, name, base_shipping_cost, free_shipping_threshold, is_active, sort_order
                FROM shop.shipping_zone
                WHERE id = $1
                ",
            )
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(
            |(id, name, base_shipping_cost, free_shipping_threshold, is_active, sort_order)| {
                ShippingZone {
                    id,
                    name,
                    base_shipping_cost,
                    free_shipping_threshold,
                    is_active,
                    sort_order,
                }
            },
        ))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_zone(&self, input: &ZoneInput) -> Result<ShippingZoneId, RepositoryError> {
        let id: ShippingZoneId = sqlx::query_scalar(
            r"
            INSERT INTO shop.shipping_zone
                (name, base_shipping_cost, free_shipping_threshold, is_active, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(input.base_shipping_cost)
        .bind(input.free_shipping_threshold)
        .bind(input.is_active)
        .bind(input.sort_order)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the zone does not exist.
    pub async fn update_zone(
        &self,
        id: ShippingZoneId,
        input: &ZoneInput,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.shipping_zone
            SET name = $2, base_shipping_cost = $3, free_shipping_threshold = $4,
                is_active = $5, sort_order = $6
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.base_shipping_cost)
        .bind(input.free_shipping_threshold)
        .bind(input.is_active)
        .bind(input.sort_order)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// A slug typed into the form, normalized. Blank means derive one.
fn requested_slug(requested: &str) -> Option<String> {
    let requested = requested.trim();
    (!requested.is_empty()).then(|| slugify(requested))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_slug_is_derived() {
        assert_eq!(requested_slug(" "), None);
        assert_eq!(requested_slug(""), None);
    }

    #[test]
    fn test_typed_slug_is_normalized() {
        assert_eq!(
            requested_slug("East Azarbaijan").as_deref(),
            Some("east-azarbaijan")
        );
    }
}

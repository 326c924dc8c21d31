//! Provinces, cities and shipping zones.

use sqlx::{PgConnection, PgPool};

use super::RepositoryError;
use crate::location::{
    City, CitySeed, CityWithZone, Province, ProvinceSeed, ProvinceWithCities, ShippingZone,
};
use crate::shipping::ZoneRate;
use crate::types::{CityId, ProvinceId, ShippingZoneId, Toman, city_slug, slugify};

#[derive(Debug, sqlx::FromRow)]
struct ProvinceRow {
    id: ProvinceId,
    name: String,
    slug: String,
    sort_order: i32,
    is_active: bool,
}

impl From<ProvinceRow> for Province {
    fn from(row: ProvinceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            sort_order: row.sort_order,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CityRow {
    id: CityId,
    province_id: ProvinceId,
    name: String,
    slug: String,
    sort_order: i32,
    is_active: bool,
    is_popular: bool,
    delivery_available: bool,
    shipping_zone_id: Option<ShippingZoneId>,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        Self {
            id: row.id,
            province_id: row.province_id,
            name: row.name,
            slug: row.slug,
            sort_order: row.sort_order,
            is_active: row.is_active,
            is_popular: row.is_popular,
            delivery_available: row.delivery_available,
            shipping_zone_id: row.shipping_zone_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CityZoneRow {
    #[sqlx(flatten)]
    city: CityRow,
    province_name: String,
    zone_base_cost: Option<Toman>,
    zone_free_threshold: Option<Toman>,
    zone_is_active: Option<bool>,
}

#[derive(Debug, sqlx::FromRow)]
struct ZoneRow {
    id: ShippingZoneId,
    name: String,
    base_shipping_cost: Toman,
    free_shipping_threshold: Option<Toman>,
    is_active: bool,
    sort_order: i32,
}

impl From<ZoneRow> for ShippingZone {
    fn from(row: ZoneRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            base_shipping_cost: row.base_shipping_cost,
            free_shipping_threshold: row.free_shipping_threshold,
            is_active: row.is_active,
            sort_order: row.sort_order,
        }
    }
}

const CITY_COLUMNS: &str = r"
    c.id, c.province_id, c.name, c.slug, c.sort_order, c.is_active, c.is_popular,
    c.delivery_available, c.shipping_zone_id
";

/// Whether an upsert inserted a new row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

/// Repository for location lookups.
pub struct LocationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LocationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active provinces, each with its active cities, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn active_provinces_with_cities(
        &self,
    ) -> Result<Vec<ProvinceWithCities>, RepositoryError> {
        let provinces = sqlx::query_as::<_, ProvinceRow>(
            r"
            SELECT id, name, slug, sort_order, is_active
            FROM shop.province
            WHERE is_active
            ORDER BY sort_order, name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let sql = format!(
            "SELECT {CITY_COLUMNS} FROM shop.city c
             JOIN shop.province p ON p.id = c.province_id
             WHERE c.is_active AND p.is_active
             ORDER BY c.sort_order, c.name"
        );
        let cities = sqlx::query_as::<_, CityRow>(&sql).fetch_all(self.pool).await?;

        let mut out: Vec<ProvinceWithCities> = provinces
            .into_iter()
            .map(|row| ProvinceWithCities {
                province: row.into(),
                cities: Vec::new(),
            })
            .collect();
        for city in cities {
            if let Some(entry) = out.iter_mut().find(|p| p.province.id == city.province_id) {
                entry.cities.push(city.into());
            }
        }
        Ok(out)
    }

    /// A city with its province name and zone rate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn city_with_zone(&self, id: CityId) -> Result<Option<CityWithZone>, RepositoryError> {
        let sql = format!(
            "SELECT {CITY_COLUMNS}, p.name AS province_name,
                    z.base_shipping_cost AS zone_base_cost,
                    z.free_shipping_threshold AS zone_free_threshold,
                    z.is_active AS zone_is_active
             FROM shop.city c
             JOIN shop.province p ON p.id = c.province_id
             LEFT JOIN shop.shipping_zone z ON z.id = c.shipping_zone_id
             WHERE c.id = $1"
        );
        let row = sqlx::query_as::<_, CityZoneRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|row| {
            let zone = match (row.zone_base_cost, row.zone_is_active) {
                (Some(base_shipping_cost), Some(is_active)) => Some(ZoneRate {
                    base_shipping_cost,
                    free_shipping_threshold: row.zone_free_threshold,
                    is_active,
                }),
                _ => None,
            };
            CityWithZone {
                city: row.city.into(),
                province_name: row.province_name,
                zone,
            }
        }))
    }

    /// All provinces, for admin lists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn provinces(&self) -> Result<Vec<Province>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProvinceRow>(
            "SELECT id, name, slug, sort_order, is_active FROM shop.province ORDER BY sort_order, name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// All shipping zones, for admin lists and pickers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn zones(&self) -> Result<Vec<ShippingZone>, RepositoryError> {
        let rows = sqlx::query_as::<_, ZoneRow>(
            r"
            SELECT id, name, base_shipping_cost, free_shipping_threshold, is_active, sort_order
            FROM shop.shipping_zone
            ORDER BY sort_order, name
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Import
// =============================================================================

/// Delete every city and province. Orders and profiles keep their rows with
/// the city reference cleared.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a delete fails.
pub async fn reset_locations(conn: &mut PgConnection) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.city").execute(&mut *conn).await?;
    sqlx::query("DELETE FROM shop.province").execute(&mut *conn).await?;
    Ok(())
}

/// Insert or update a province by slug.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn upsert_province(
    conn: &mut PgConnection,
    seed: &ProvinceSeed,
) -> Result<(ProvinceId, Upserted), RepositoryError> {
    let slug = if seed.slug.trim().is_empty() {
        slugify(&seed.name)
    } else {
        seed.slug.trim().to_owned()
    };
    let (id, inserted): (ProvinceId, bool) = sqlx::query_as(
        r"
        INSERT INTO shop.province (name, slug, sort_order, is_active)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name,
                sort_order = EXCLUDED.sort_order,
                is_active = EXCLUDED.is_active
        RETURNING id, (xmax = 0) AS inserted
        ",
    )
    .bind(&seed.name)
    .bind(&slug)
    .bind(seed.order)
    .bind(seed.is_active)
    .fetch_one(&mut *conn)
    .await?;

    Ok((id, if inserted { Upserted::Created } else { Upserted::Updated }))
}

/// Insert or update a city by `(province, name)`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn upsert_city(
    conn: &mut PgConnection,
    province_id: ProvinceId,
    province_name: &str,
    seed: &CitySeed,
) -> Result<Upserted, RepositoryError> {
    let slug = if seed.slug.trim().is_empty() {
        city_slug(province_name, &seed.name)
    } else {
        seed.slug.trim().to_owned()
    };
    let inserted: bool = sqlx::query_scalar(
        r"
        INSERT INTO shop.city
            (province_id, name, slug, sort_order, is_active, is_popular, delivery_available)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (province_id, name) DO UPDATE
            SET slug = EXCLUDED.slug,
                sort_order = EXCLUDED.sort_order,
                is_active = EXCLUDED.is_active,
                is_popular = EXCLUDED.is_popular,
                delivery_available = EXCLUDED.delivery_available
        RETURNING (xmax = 0)
        ",
    )
    .bind(province_id)
    .bind(&seed.name)
    .bind(&slug)
    .bind(seed.order)
    .bind(seed.is_active)
    .bind(seed.is_popular)
    .bind(seed.delivery_available)
    .fetch_one(&mut *conn)
    .await?;

    Ok(if inserted {
        Upserted::Created
    } else {
        Upserted::Updated
    })
}

//! Short-lived cache for data shown on every page.
//!
//! Site settings, the category menu and the city picker are read on each
//! request but only change from the admin panel, which runs in another
//! process. Entries expire after a minute instead of being invalidated.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use iranmarket_core::db::{LocationRepository, RepositoryError, SiteSettingRepository};
use iranmarket_core::location::ProvinceWithCities;
use iranmarket_core::settings::SiteSettings;

use crate::db::catalog::CatalogRepository;
use crate::models::Category;

const TTL: Duration = Duration::from_secs(60);

/// Cache key for page-context data.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Settings,
    Categories,
    Provinces,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Settings(Box<SiteSettings>),
    Categories(Vec<Category>),
    Provinces(Vec<ProvinceWithCities>),
}

/// Read-through cache in front of the settings, category and location tables.
#[derive(Clone)]
pub struct SiteCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for SiteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().max_capacity(16).time_to_live(TTL).build(),
        }
    }

    /// Site settings, or the defaults when none were saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    pub async fn settings(&self, pool: &PgPool) -> Result<SiteSettings, RepositoryError> {
        if let Some(CacheValue::Settings(settings)) = self.cache.get(&CacheKey::Settings).await {
            debug!("Cache hit for site settings");
            return Ok(*settings);
        }
        let settings = SiteSettingRepository::new(pool).get_or_default().await?;
        self.cache
            .insert(
                CacheKey::Settings,
                CacheValue::Settings(Box::new(settings.clone())),
            )
            .await;
        Ok(settings)
    }

    /// Active categories in menu order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    pub async fn categories(&self, pool: &PgPool) -> Result<Vec<Category>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }
        let categories = CatalogRepository::new(pool).active_categories().await?;
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;
        Ok(categories)
    }

    /// Active provinces with their active cities.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    pub async fn provinces(
        &self,
        pool: &PgPool,
    ) -> Result<Vec<ProvinceWithCities>, RepositoryError> {
        if let Some(CacheValue::Provinces(provinces)) = self.cache.get(&CacheKey::Provinces).await {
            debug!("Cache hit for provinces");
            return Ok(provinces);
        }
        let provinces = LocationRepository::new(pool)
            .active_provinces_with_cities()
            .await?;
        self.cache
            .insert(CacheKey::Provinces, CacheValue::Provinces(provinces.clone()))
            .await;
        Ok(provinces)
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

//! Province and city import.
//!
//! Reads a JSON array of provinces, each with its cities, and upserts them
//! into the `shop` schema in a single transaction. Provinces match on slug,
//! cities on `(province, name)`. A blank slug is derived from the name.
//!
//! ```json
//! [
//!   {"name": "تهران", "slug": "tehran", "order": 1, "is_active": true,
//!    "cities": [{"name": "تهران", "is_popular": true}]}
//! ]
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront database (falls back to `DATABASE_URL`)

use std::fmt;

use secrecy::SecretString;
use thiserror::Error;

use iranmarket_core::db::{RepositoryError, create_pool};
use iranmarket_core::db::locations::{Upserted, reset_locations, upsert_city, upsert_province};
use iranmarket_core::location::ProvinceSeed;

use super::database_url;

/// Used when `--file` is not given.
pub const DEFAULT_FILE: &str = "data/iran_locations.json";

/// Errors that can occur during the import.
#[derive(Debug, Error)]
pub enum LocationImportError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid locations file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Rows touched by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub provinces_created: usize,
    pub provinces_updated: usize,
    pub cities_created: usize,
    pub cities_updated: usize,
}

impl ImportCounts {
    const fn record_province(&mut self, outcome: Upserted) {
        match outcome {
            Upserted::Created => self.provinces_created += 1,
            Upserted::Updated => self.provinces_updated += 1,
        }
    }

    const fn record_city(&mut self, outcome: Upserted) {
        match outcome {
            Upserted::Created => self.cities_created += 1,
            Upserted::Updated => self.cities_updated += 1,
        }
    }
}

impl fmt::Display for ImportCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Provinces: {} created, {} updated. Cities: {} created, {} updated.",
            self.provinces_created, self.provinces_updated, self.cities_created, self.cities_updated
        )
    }
}

/// Parse the contents of a locations file.
///
/// # Errors
///
/// Returns `serde_json::Error` if the JSON does not match the expected shape.
pub fn parse(contents: &str) -> Result<Vec<ProvinceSeed>, serde_json::Error> {
    let mut provinces: Vec<ProvinceSeed> = serde_json::from_str(contents)?;
    for province in &mut provinces {
        province.name = province.name.trim().to_owned();
        for city in &mut province.cities {
            city.name = city.name.trim().to_owned();
        }
    }
    Ok(provinces)
}

/// Import `path`, optionally wiping existing locations first.
///
/// Nothing is written unless the whole file goes through.
///
/// # Errors
///
/// Returns `LocationImportError` if the file cannot be read or parsed, or a
/// database statement fails.
pub async fn load(path: &str, reset: bool) -> Result<ImportCounts, LocationImportError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LocationImportError::Read {
        path: path.to_owned(),
        source,
    })?;
    let provinces = parse(&contents)?;

    let url = database_url("STOREFRONT_DATABASE_URL")
        .ok_or(LocationImportError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;
    let pool = create_pool(&SecretString::from(url)).await?;

    let mut tx = pool.begin().await?;
    if reset {
        tracing::warn!("Deleting existing cities and provinces");
        reset_locations(&mut *tx).await?;
    }

    let mut counts = ImportCounts::default();
    for province in &provinces {
        let (province_id, outcome) = upsert_province(&mut *tx, province).await?;
        counts.record_province(outcome);
        for city in &province.cities {
            counts.record_city(upsert_city(&mut *tx, province_id, &province.name, city).await?);
        }
    }
    tx.commit().await?;

    tracing::info!(
        file = path,
        reset,
        provinces = provinces.len(),
        "Locations imported"
    );
    Ok(counts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_applies_defaults_and_trims_names() {
        let provinces = parse(
            r#"[
                {"name": " اصفهان ", "slug": "isfahan", "order": 3,
                 "cities": [{"name": "کاشان ", "is_popular": true}]},
                {"name": "یزد", "is_active": false}
            ]"#,
        )
        .unwrap();

        assert_eq!(provinces.len(), 2);
        assert_eq!(provinces[0].name, "اصفهان");
        assert_eq!(provinces[0].order, 3);
        assert_eq!(provinces[0].cities[0].name, "کاشان");
        assert!(provinces[0].cities[0].is_popular);
        assert!(provinces[0].cities[0].delivery_available);
        assert!(!provinces[1].is_active);
        assert!(provinces[1].cities.is_empty());
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(parse(r#"{"name": "تهران"}"#).is_err());
        assert!(parse(r#"[{"slug": "tehran"}]"#).is_err());
    }

    #[test]
    fn test_counts_summary() {
        let mut counts = ImportCounts::default();
        counts.record_province(Upserted::Created);
        counts.record_province(Upserted::Updated);
        counts.record_city(Upserted::Created);
        counts.record_city(Upserted::Created);
        assert_eq!(
            counts.to_string(),
            "Provinces: 1 created, 1 updated. Cities: 2 created, 0 updated."
        );
    }

    #[test]
    fn test_bundled_file_parses() {
        let contents = include_str!("../../../../data/iran_locations.json");
        let provinces = parse(contents).unwrap();
        assert!(provinces.iter().any(|p| p.slug == "tehran"));
        assert!(provinces.iter().all(|p| !p.cities.is_empty()));
    }
}

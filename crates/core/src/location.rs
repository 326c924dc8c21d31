//! Provinces, cities and shipping zones.

use serde::{Deserialize, Serialize};

use crate::shipping::{Destination, ZoneRate};
use crate::types::{CityId, ProvinceId, ShippingZoneId, Toman};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: ProvinceId,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub province_id: ProvinceId,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub is_popular: bool,
    pub delivery_available: bool,
    pub shipping_zone_id: Option<ShippingZoneId>,
}

/// A group of cities sharing one shipping price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingZone {
    pub id: ShippingZoneId,
    pub name: String,
    pub base_shipping_cost: Toman,
    pub free_shipping_threshold: Option<Toman>,
    pub is_active: bool,
    pub sort_order: i32,
}

impl ShippingZone {
    #[must_use]
    pub const fn rate(&self) -> ZoneRate {
        ZoneRate {
            base_shipping_cost: self.base_shipping_cost,
            free_shipping_threshold: self.free_shipping_threshold,
            is_active: self.is_active,
        }
    }
}

/// A city together with its zone, ready for a shipping quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityWithZone {
    pub city: City,
    pub province_name: String,
    pub zone: Option<ZoneRate>,
}

impl CityWithZone {
    #[must_use]
    pub const fn destination(&self) -> Destination {
        Destination {
            delivery_available: self.city.delivery_available,
            zone: self.zone,
        }
    }

    /// "City، Province" as shown in the header city picker.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}، {}", self.city.name, self.province_name)
    }
}

/// A province and its active cities, for the city picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceWithCities {
    pub province: Province,
    pub cities: Vec<City>,
}

/// One province entry of the location import file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProvinceSeed {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub cities: Vec<CitySeed>,
}

/// One city entry of the location import file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CitySeed {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default = "default_true")]
    pub delivery_available: bool,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_defaults() {
        let seeds: Vec<ProvinceSeed> = serde_json::from_str(
            r#"[{"name": "تهران", "slug": "tehran", "cities": [{"name": "تهران"}]}]"#,
        )
        .unwrap();
        let tehran = &seeds[0];
        assert!(tehran.is_active);
        assert_eq!(tehran.order, 0);
        let city = &tehran.cities[0];
        assert!(city.is_active && city.delivery_available && !city.is_popular);
        assert!(city.slug.is_empty());
    }

    #[test]
    fn test_destination_from_city() {
        let cwz = CityWithZone {
            city: City {
                id: CityId::new(1),
                province_id: ProvinceId::new(1),
                name: "کرج".to_owned(),
                slug: "alborz-karaj".to_owned(),
                sort_order: 0,
                is_active: true,
                is_popular: true,
                delivery_available: false,
                shipping_zone_id: None,
            },
            province_name: "البرز".to_owned(),
            zone: None,
        };
        assert!(!cwz.destination().delivery_available);
        assert_eq!(cwz.display_name(), "کرج، البرز");
    }
}

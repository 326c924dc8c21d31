//! Shipping cost by destination city and its shipping zone.

use serde::{Deserialize, Serialize};

use crate::types::Toman;

/// Pricing of the zone a city belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRate {
    pub base_shipping_cost: Toman,
    pub free_shipping_threshold: Option<Toman>,
    pub is_active: bool,
}

/// Everything the quote needs to know about the chosen city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub delivery_available: bool,
    pub zone: Option<ZoneRate>,
}

/// Shipping cost for an order of `items_total` going to `destination`.
///
/// Anything that cannot be priced (no city chosen, delivery unavailable, a
/// missing or disabled zone) ships for free; the checkout page tells the
/// customer delivery terms separately. A threshold of zero counts as unset.
///
/// ```
/// use iranmarket_core::shipping::{shipping_cost, Destination, ZoneRate};
/// use iranmarket_core::Toman;
///
/// let tehran = Destination {
///     delivery_available: true,
///     zone: Some(ZoneRate {
///         base_shipping_cost: Toman::new(45_000),
///         free_shipping_threshold: Some(Toman::new(1_000_000)),
///         is_active: true,
///     }),
/// };
/// assert_eq!(shipping_cost(Some(&tehran), Toman::new(300_000)), Toman::new(45_000));
/// assert_eq!(shipping_cost(Some(&tehran), Toman::new(1_000_000)), Toman::ZERO);
/// assert_eq!(shipping_cost(None, Toman::new(300_000)), Toman::ZERO);
/// ```
#[must_use]
pub fn shipping_cost(destination: Option<&Destination>, items_total: Toman) -> Toman {
    let Some(destination) = destination else {
        return Toman::ZERO;
    };
    if !destination.delivery_available {
        return Toman::ZERO;
    }
    let Some(zone) = destination.zone.filter(|z| z.is_active) else {
        return Toman::ZERO;
    };
    match zone.free_shipping_threshold {
        Some(threshold) if threshold > Toman::ZERO && items_total >= threshold => Toman::ZERO,
        _ => zone.base_shipping_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(base: i64, threshold: Option<i64>, active: bool) -> ZoneRate {
        ZoneRate {
            base_shipping_cost: Toman::new(base),
            free_shipping_threshold: threshold.map(Toman::new),
            is_active: active,
        }
    }

    #[test]
    fn test_no_delivery_is_free() {
        let d = Destination {
            delivery_available: false,
            zone: Some(zone(30_000, None, true)),
        };
        assert_eq!(shipping_cost(Some(&d), Toman::new(10)), Toman::ZERO);
    }

    #[test]
    fn test_missing_or_inactive_zone_is_free() {
        let none = Destination {
            delivery_available: true,
            zone: None,
        };
        let inactive = Destination {
            delivery_available: true,
            zone: Some(zone(30_000, None, false)),
        };
        assert_eq!(shipping_cost(Some(&none), Toman::new(10)), Toman::ZERO);
        assert_eq!(shipping_cost(Some(&inactive), Toman::new(10)), Toman::ZERO);
    }

    #[test]
    fn test_threshold_boundary() {
        let d = Destination {
            delivery_available: true,
            zone: Some(zone(30_000, Some(500_000), true)),
        };
        assert_eq!(shipping_cost(Some(&d), Toman::new(499_999)), Toman::new(30_000));
        assert_eq!(shipping_cost(Some(&d), Toman::new(500_000)), Toman::ZERO);
    }

    #[test]
    fn test_zero_threshold_is_unset() {
        let d = Destination {
            delivery_available: true,
            zone: Some(zone(25_000, Some(0), true)),
        };
        assert_eq!(shipping_cost(Some(&d), Toman::new(120_000)), Toman::new(25_000));
    }

    #[test]
    fn test_no_threshold_always_charges() {
        let d = Destination {
            delivery_available: true,
            zone: Some(zone(25_000, None, true)),
        };
        assert_eq!(shipping_cost(Some(&d), Toman::new(9_000_000)), Toman::new(25_000));
    }
}

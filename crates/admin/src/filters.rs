//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use iranmarket_core::group_thousands;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Money column: `{{ order.total_price|toman }}` renders `1,250,000 تومان`.
#[askama::filter_fn]
pub fn toman(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(grouped(&raw).map_or(raw, |n| format!("{n} تومان")))
}

/// Counts with separators: `{{ counts.total|thousands }}`.
#[askama::filter_fn]
pub fn thousands(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(grouped(&raw).unwrap_or(raw))
}

fn grouped(raw: &str) -> Option<String> {
    raw.trim().parse::<i64>().ok().map(group_thousands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped() {
        assert_eq!(grouped("1250000").as_deref(), Some("1,250,000"));
        assert_eq!(grouped(" 12 ").as_deref(), Some("12"));
        assert_eq!(grouped("-"), None);
    }
}

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

/// Formats an amount as Toman with thousands separators.
///
/// Accepts a `Toman` or a bare integer; anything that does not look like a
/// number is shown as-is.
///
/// Usage in templates: `{{ product.price|toman }}` renders `85,000 تومان`
#[askama::filter_fn]
pub fn toman(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_toman(&value.to_string()))
}

fn format_toman(raw: &str) -> String {
    if raw.ends_with("تومان") {
        return raw.to_owned();
    }
    raw.trim()
        .parse::<i64>()
        .map_or_else(|_| raw.to_owned(), |n| format!("{} تومان", group_thousands(n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_toman() {
        assert_eq!(format_toman("85000"), "85,000 تومان");
        assert_eq!(format_toman("0"), "0 تومان");
        assert_eq!(format_toman("85,000 تومان"), "85,000 تومان");
        assert_eq!(format_toman("n/a"), "n/a");
    }
}

//! Parsing helpers for admin forms.
//!
//! Browsers send every field as text, empty when left blank, and staff often
//! type Persian digits. Parse failures carry a Persian message for the page.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use iranmarket_core::{Toman, tz};

/// `datetime-local` input format.
const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Replace Persian and Arabic-Indic digits with ASCII ones and drop
/// thousands separators.
#[must_use]
pub fn normalize_number(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '٬' | '،' | ' '))
        .map(|c| match c {
            '۰'..='۹' => char::from_digit(u32::from(c) - u32::from('۰'), 10).unwrap_or(c),
            '٠'..='٩' => char::from_digit(u32::from(c) - u32::from('٠'), 10).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Checkbox value; unchecked boxes are absent from the form.
#[must_use]
pub fn checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// A required text field, trimmed.
///
/// # Errors
///
/// Returns a message naming `label` when the field is blank.
pub fn required(value: &str, label: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{label} الزامی است."));
    }
    Ok(value.to_owned())
}

/// An integer, or `default` when blank.
///
/// # Errors
///
/// Returns a message naming `label` when the value is not a number.
pub fn int_or(value: &str, default: i32, label: &str) -> Result<i32, String> {
    let normalized = normalize_number(value);
    if normalized.is_empty() {
        return Ok(default);
    }
    normalized
        .parse::<i32>()
        .map_err(|_| format!("{label} باید عدد باشد."))
}

/// A non-negative amount in Toman, or `None` when blank.
///
/// # Errors
///
/// Returns a message naming `label` for text or negative amounts.
pub fn optional_toman(value: &str, label: &str) -> Result<Option<Toman>, String> {
    let normalized = normalize_number(value);
    if normalized.is_empty() {
        return Ok(None);
    }
    match normalized.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(Some(Toman::new(n))),
        Ok(_) => Err(format!("{label} نمی‌تواند منفی باشد.")),
        Err(_) => Err(format!("{label} باید عدد باشد.")),
    }
}

/// A required non-negative amount in Toman.
///
/// # Errors
///
/// Returns a message naming `label` when blank, text or negative.
pub fn toman(value: &str, label: &str) -> Result<Toman, String> {
    optional_toman(value, label)?.ok_or_else(|| format!("{label} الزامی است."))
}

/// A `datetime-local` value entered in Tehran time.
///
/// # Errors
///
/// Returns a message naming `label` when blank or malformed.
pub fn local_datetime(value: &str, label: &str) -> Result<DateTime<Utc>, String> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), DATETIME_LOCAL_FORMAT)
        .map_err(|_| format!("{label} معتبر نیست."))?;
    tz::tehran()
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("{label} معتبر نیست."))
}

/// Render an instant for a `datetime-local` input, in Tehran time.
#[must_use]
pub fn datetime_input(at: DateTime<Utc>) -> String {
    at.with_timezone(&tz::tehran())
        .format(DATETIME_LOCAL_FORMAT)
        .to_string()
}

/// An optional numeric id from a `<select>`; blank or invalid means none.
#[must_use]
pub fn optional_id(value: &str) -> Option<i32> {
    normalize_number(value).parse::<i32>().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_number() {
        assert_eq!(normalize_number(" ۱۲۵٬۰۰۰ "), "125000");
        assert_eq!(normalize_number("٣٤"), "34");
        assert_eq!(normalize_number("1,200"), "1200");
    }

    #[test]
    fn test_toman_fields() {
        assert_eq!(toman("۸۵۰۰۰", "قیمت").unwrap(), Toman::new(85_000));
        assert_eq!(toman("", "قیمت").unwrap_err(), "قیمت الزامی است.");
        assert_eq!(toman("-5", "قیمت").unwrap_err(), "قیمت نمی‌تواند منفی باشد.");
        assert_eq!(optional_toman("", "تخفیف").unwrap(), None);
        assert!(optional_toman("abc", "تخفیف").is_err());
    }

    #[test]
    fn test_int_or_default() {
        assert_eq!(int_or("", 0, "ترتیب").unwrap(), 0);
        assert_eq!(int_or("۳", 0, "ترتیب").unwrap(), 3);
        assert!(int_or("x", 0, "ترتیب").is_err());
    }

    #[test]
    fn test_local_datetime_is_tehran_time() {
        let at = local_datetime("2025-03-21T00:30", "شروع").unwrap();
        assert_eq!(at.to_rfc3339(), "2025-03-20T21:00:00+00:00");
        assert_eq!(datetime_input(at), "2025-03-21T00:30");
        assert!(local_datetime("", "شروع").is_err());
    }

    #[test]
    fn test_checked_and_required() {
        assert!(checked(Some("on")));
        assert!(!checked(None));
        assert!(!checked(Some("")));
        assert_eq!(required("  نان ", "نام").unwrap(), "نان");
        assert_eq!(required(" ", "نام").unwrap_err(), "نام الزامی است.");
    }
}

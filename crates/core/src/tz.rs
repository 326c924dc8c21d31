//! Store-local time.
//!
//! The store runs on Tehran time, which has had a fixed UTC+03:30 offset
//! since daylight saving was abolished in 2022.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Offset of Asia/Tehran from UTC, in seconds.
pub const TEHRAN_UTC_OFFSET_SECS: i32 = 3 * 3600 + 30 * 60;

/// The Tehran fixed offset.
#[must_use]
pub fn tehran() -> FixedOffset {
    FixedOffset::east_opt(TEHRAN_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// `YYYY/MM/DD - HH:MM` in Tehran time.
#[must_use]
pub fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&tehran())
        .format("%Y/%m/%d - %H:%M")
        .to_string()
}

/// `YYYY/MM/DD` in Tehran time.
#[must_use]
pub fn format_local_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&tehran()).format("%Y/%m/%d").to_string()
}

/// The Tehran calendar date of an instant.
#[must_use]
pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&tehran()).date_naive()
}

/// UTC bounds `[start, end)` of a Tehran calendar day.
#[must_use]
pub fn local_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_local = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let start = tehran()
        .from_local_datetime(&start_local)
        .single()
        .map_or_else(|| start_local.and_utc(), |dt| dt.with_timezone(&Utc));
    let end = start
        .checked_add_days(Days::new(1))
        .unwrap_or(start);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_local_shifts_offset() {
        let at = Utc.with_ymd_and_hms(2024, 3, 20, 21, 0, 0).single();
        let at = at.unwrap_or_default();
        assert_eq!(format_local(at), "2024/03/21 - 00:30");
        assert_eq!(format_local_date(at), "2024/03/21");
    }

    #[test]
    fn test_local_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 21).unwrap_or_default();
        let (start, end) = local_day_bounds(date);
        assert_eq!(start.to_rfc3339(), "2024-03-20T20:30:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-21T20:30:00+00:00");
    }

    #[test]
    fn test_local_date_near_midnight() {
        let late = Utc
            .with_ymd_and_hms(2024, 1, 1, 20, 45, 0)
            .single()
            .unwrap_or_default();
        assert_eq!(
            local_date(late),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default()
        );
    }
}

//! Time utilities — date parsing and range conversion
//!
//! All date-to-timestamp conversion happens at the API handler layer;
//! the repository layer only ever receives `i64` Unix millis.

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};

use super::{AppError, AppResult};

/// Current time as Unix millis
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Start of day (00:00:00 UTC) as Unix millis
pub fn day_start_millis(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
        .timestamp_millis()
}

/// End of day as Unix millis — next day 00:00:00, callers use `< end` semantics
pub fn day_end_millis(date: NaiveDate) -> i64 {
    let next = date.succ_opt().unwrap_or(date);
    day_start_millis(next)
}

/// Resolve a named range preset to `(start_millis, end_millis)`
///
/// Supported presets: today | yesterday | 7days | 30days | thisMonth |
/// lastMonth | custom (requires explicit start/end dates).
pub fn resolve_range(
    range: &str,
    custom_start: Option<&str>,
    custom_end: Option<&str>,
) -> AppResult<(i64, i64)> {
    let today = Utc::now().date_naive();

    let (start, end) = match range {
        "today" => (today, today),
        "yesterday" => {
            let d = today - Duration::days(1);
            (d, d)
        }
        "7days" => (today - Duration::days(6), today),
        "30days" => (today - Duration::days(29), today),
        "thisMonth" => (today.with_day(1).unwrap_or(today), today),
        "lastMonth" => {
            let first_of_this = today.with_day(1).unwrap_or(today);
            let last_of_prev = first_of_this - Duration::days(1);
            (last_of_prev.with_day(1).unwrap_or(last_of_prev), last_of_prev)
        }
        "custom" => {
            let (Some(s), Some(e)) = (custom_start, custom_end) else {
                return Err(AppError::validation(
                    "custom range requires startDate and endDate",
                ));
            };
            (parse_date(s)?, parse_date(e)?)
        }
        _ => (today - Duration::days(6), today),
    };

    if start > end {
        return Err(AppError::validation("startDate must not be after endDate"));
    }

    Ok((day_start_millis(start), day_end_millis(end)))
}

/// Format Unix millis as a day key (YYYY-MM-DD, UTC)
pub fn day_key(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Format Unix millis as a month key (YYYY-MM, UTC)
pub fn month_key(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2025-03-01").is_ok());
        assert!(parse_date("01/03/2025").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }

    #[test]
    fn test_day_bounds() {
        let date = parse_date("2025-03-01").unwrap();
        let start = day_start_millis(date);
        let end = day_end_millis(date);
        assert_eq!(end - start, 24 * 3600 * 1000);
    }

    #[test]
    fn test_day_key_roundtrip() {
        let date = parse_date("2025-03-01").unwrap();
        assert_eq!(day_key(day_start_millis(date)), "2025-03-01");
        assert_eq!(month_key(day_start_millis(date)), "2025-03");
    }

    #[test]
    fn test_custom_range_requires_dates() {
        assert!(resolve_range("custom", None, None).is_err());
        assert!(resolve_range("custom", Some("2025-01-01"), Some("2025-01-31")).is_ok());
        assert!(resolve_range("custom", Some("2025-02-01"), Some("2025-01-01")).is_err());
    }
}

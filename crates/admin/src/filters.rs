//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime, Utc};

use bistro_core::Price;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Relative age of a UTC timestamp, e.g. "5 minutes ago".
///
/// Anything a week or older renders as a date (`Mar 4, 2025`). Values that
/// do not parse as a timestamp are rendered unchanged.
///
/// Usage in templates: `{{ entry.created_at|time_ago }}`
#[askama::filter_fn]
pub fn time_ago(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(parse_utc(&raw).map_or(raw, |then| relative_time(then, Utc::now())))
}

/// Format a price as `$1,234.50`.
///
/// Usage in templates: `{{ item.price|currency }}`
#[askama::filter_fn]
pub fn currency(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(Price::parse(&raw).map_or(raw, |price| price.display()))
}

/// Parse the `Display` output of `DateTime<Utc>` or an RFC 3339 string.
fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw.strip_suffix(" UTC")?;
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Human-friendly distance between `then` and `now`.
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        0..60 => format!("{secs} seconds ago"),
        60..3_600 => plural(secs / 60, "minute"),
        3_600..86_400 => plural(secs / 3_600, "hour"),
        86_400..604_800 => plural(secs / 86_400, "day"),
        _ => then.format("%b %-d, %Y").to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_time_units() {
        let now = at(2025, 3, 14);
        assert_eq!(relative_time(now - Duration::seconds(5), now), "5 seconds ago");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::minutes(42), now), "42 minutes ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_time(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_time(now - Duration::days(6), now), "6 days ago");
    }

    #[test]
    fn test_relative_time_falls_back_to_date() {
        let now = at(2025, 3, 14);
        assert_eq!(relative_time(at(2025, 3, 4), now), "Mar 4, 2025");
    }

    #[test]
    fn test_parse_utc_accepts_display_output() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 4, 18, 30, 0).unwrap();
        assert_eq!(parse_utc(&dt.to_string()), Some(dt));
        assert_eq!(parse_utc("2025-03-04T18:30:00Z"), Some(dt));
        assert_eq!(parse_utc("yesterday"), None);
    }
}

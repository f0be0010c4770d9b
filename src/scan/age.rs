//! Date parsing and domain-age rendering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::config::{AGE_DAYS_PER_MONTH, AGE_DAYS_PER_YEAR};

/// Date-only formats accepted from WHOIS services.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

/// Date-time formats accepted from WHOIS services and our own records.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S UTC",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses a date string in any of the accepted formats.
///
/// Tries RFC 3339 first, then the known date-time and date-only formats.
/// Returns `None` when nothing matches.
pub fn parse_date_string(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}

/// Renders the age of a creation date as `Y year(s) M month(s) D day(s)`.
///
/// Uses fixed 365-day years and 30-day months. Zero components are omitted;
/// when all three are zero (or the date is in the future) the result is
/// `Less than 1 day`. An unparseable input passes through unchanged so odd
/// WHOIS values stay visible rather than vanishing.
pub fn compute_age(created: &str) -> String {
    let Some(created_at) = parse_date_string(created) else {
        return created.to_string();
    };

    let total_days = (Utc::now() - created_at).num_days().max(0);
    let years = total_days / AGE_DAYS_PER_YEAR;
    let remainder = total_days % AGE_DAYS_PER_YEAR;
    let months = remainder / AGE_DAYS_PER_MONTH;
    let days = remainder % AGE_DAYS_PER_MONTH;

    let mut parts = Vec::new();
    if years > 0 {
        parts.push(format!("{} year{}", years, if years == 1 { "" } else { "s" }));
    }
    if months > 0 {
        parts.push(format!(
            "{} month{}",
            months,
            if months == 1 { "" } else { "s" }
        ));
    }
    if days > 0 {
        parts.push(format!("{} day{}", days, if days == 1 { "" } else { "s" }));
    }

    if parts.is_empty() {
        "Less than 1 day".to_string()
    } else {
        parts.join(" ")
    }
}

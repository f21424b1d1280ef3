//! Date parsing for the assorted formats the archive service and pasted
//! annotations use. Everything funnels into a `NaiveDate` and a
//! "MMM yyyy" bucket label.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date formats observed on the wire and in pasted text, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%d %b %Y",  // 9 Jan 2022 / 09 Jan 2022
    "%Y-%m-%d",  // 2022-01-09
    "%m/%d/%Y",  // 01/09/2022
    "%d %B %Y",  // 9 January 2022
    "%B %d, %Y", // January 9, 2022
];

/// Parse a date string in any supported format. Returns `None` for
/// anything unrecognized; callers treat that as "no date", not an error.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // RFC 3339 timestamps first (e.g. "2023-01-09T12:00:00Z").
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// The "MMM yyyy" bucket a date falls into.
pub fn bucket_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Parse a "MMM yyyy" bucket label back to the first of its month.
pub fn bucket_date(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("1 {label}"), "%d %b %Y").ok()
}

//! URL classification. Pure functions of the URL string: no I/O, no
//! state, same answer every time.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use url::Url;

use linkpulse_common::Category;

/// Short-ID snapshot URLs: `archive.ph/AbC12` and friends.
static ARCHIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://archive\.(?:ph|is|today)/([A-Za-z0-9]+)$").unwrap());

/// Twitter/X status URLs, including the `/i/status/` form.
static SOCIAL_STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:twitter|x)\.com/(?:[^/]+/status|i/status)/(\d+)").unwrap()
});

/// Status-ID extraction also accepts the legacy `/statuses/` form, which
/// classification does not.
static STATUS_ID_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?:twitter|x)\.com/\w+/status/(\d+)").unwrap(),
        Regex::new(r"(?:twitter|x)\.com/i/status/(\d+)").unwrap(),
        Regex::new(r"(?:twitter|x)\.com/\w+/statuses/(\d+)").unwrap(),
    ]
});

/// Classic-format snapshot path: a 14-digit timestamp segment.
static SNAPSHOT_TS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://archive\.(?:ph|is|today)/(\d{14})(?:/|$)").unwrap()
});

/// Assign a category. Rules apply in priority order; everything that is
/// neither a snapshot URL nor a social status lands in Plain.
pub fn classify(url: &str) -> Category {
    if ARCHIVE_RE.is_match(url) {
        Category::Archived
    } else if SOCIAL_STATUS_RE.is_match(url) {
        Category::SocialStatus
    } else {
        Category::Plain
    }
}

/// The opaque snapshot ID of an Archived-category URL.
pub fn archive_id(url: &str) -> Option<&str> {
    ARCHIVE_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The numeric status ID of a tweet URL, if any.
pub fn status_id(url: &str) -> Option<&str> {
    STATUS_ID_RES
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether a URL is a candidate for snapshot creation: http(s) and not
/// already pointing at the archive service.
pub fn can_be_archived(url: &str) -> bool {
    if classify(url) == Category::Archived {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Parse the 14-digit `YYYYMMDDhhmmss` timestamp embedded in a
/// classic-format snapshot path. Out-of-range components (month 13,
/// Feb 30) and absent segments both read as "no date".
///
/// This locally derived date is advisory only; when the metadata service
/// supplies an archive date, the service wins.
pub fn snapshot_timestamp(url: &str) -> Option<NaiveDateTime> {
    let caps = SNAPSHOT_TS_RE.captures(url)?;
    let digits = caps.get(1)?.as_str();

    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    let hour: u32 = digits[8..10].parse().ok()?;
    let minute: u32 = digits[10..12].parse().ok()?;
    let second: u32 = digits[12..14].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

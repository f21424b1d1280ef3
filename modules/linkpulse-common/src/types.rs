use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{bucket_date, bucket_label};

// --- URL categories ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Archived,
    SocialStatus,
    Plain,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Archived => write!(f, "Archived"),
            Category::SocialStatus => write!(f, "Social Status"),
            Category::Plain => write!(f, "Plain"),
        }
    }
}

/// A URL with its category. The category is a pure function of the URL
/// string and never changes after assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedUrl {
    pub url: String,
    pub category: Category,
}

// --- Extraction output ---

/// Distinct URL matches in first-occurrence order, plus how many times each
/// one recurred in the input (duplicates are counted, not silently dropped).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedUrls {
    pub urls: Vec<String>,
    pub occurrences: HashMap<String, u32>,
}

impl ExtractedUrls {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Total matches including repeats.
    pub fn total_matches(&self) -> u32 {
        self.occurrences.values().sum()
    }
}

// --- Archive metadata ---

/// Metadata for one archived snapshot, as resolved by the metadata service.
///
/// A record exists only after a successful lookup. A present record with
/// `archive_date: None` means "resolved, no date known", which is distinct
/// from a URL that was never resolved at all (no record in the map).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub archive_url: String,
    pub original_url: Option<String>,
    pub archive_date: Option<NaiveDate>,
    pub content_date: Option<NaiveDate>,
}

/// Aggregate outcome of one batched resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub batches_succeeded: u32,
    pub batches_failed: u32,
    pub urls_resolved: u32,
    pub urls_unresolved: u32,
    pub cancelled: bool,
}

// --- Time-bucketed series ---

/// Counts keyed by a "MMM yyyy" bucket label (e.g. "Jan 2023").
///
/// Key order in the map is incidental; consumers that need calendar order
/// must go through [`DateSeries::ordered`], which sorts by parsed date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSeries {
    buckets: BTreeMap<String, u32>,
}

impl DateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, bucket: String) {
        *self.buckets.entry(bucket).or_insert(0) += 1;
    }

    pub fn add_date(&mut self, date: NaiveDate) {
        self.increment(bucket_label(date));
    }

    pub fn get(&self, bucket: &str) -> Option<u32> {
        self.buckets.get(bucket).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets in calendar order. Labels that fail to parse sort last,
    /// keeping their lexical order among themselves.
    pub fn ordered(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> =
            self.buckets.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by_key(|(label, _)| {
            let parsed = bucket_date(label);
            (parsed.is_none(), parsed, label.to_string())
        });
        entries
    }

    /// Counts in calendar order: the value list the stats engine runs over.
    pub fn values_in_order(&self) -> Vec<u32> {
        self.ordered().into_iter().map(|(_, v)| v).collect()
    }
}

impl FromIterator<(String, u32)> for DateSeries {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            buckets: iter.into_iter().collect(),
        }
    }
}

// --- Statistics ---

/// Summary statistics over the value set of a series.
///
/// Median is the lower median (`sorted[n/2]`) and the 95th percentile is
/// `sorted[floor(n * 0.95)]`; variance is the population variance. These
/// reproduce the reference behavior exactly, including for even n.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub min: u32,
    pub max: u32,
    pub median: u32,
    pub mean: f64,
    pub percentile95: u32,
    pub variance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Increasing only for a strictly positive slope; a slope of exactly
    /// zero reports decreasing.
    pub fn direction(&self) -> TrendDirection {
        if self.slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patterns {
    pub rapid_increase: bool,
    pub seasonality: bool,
}

/// Full analytics for one series. `stats` is `None` for an empty series:
/// "no data", never NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesAnalytics {
    pub stats: Option<SeriesStats>,
    pub anomalies: HashMap<String, u32>,
    pub trend: Trend,
    pub patterns: Patterns,
}

impl Default for SeriesAnalytics {
    fn default() -> Self {
        Self {
            stats: None,
            anomalies: HashMap::new(),
            trend: Trend {
                slope: 0.0,
                intercept: 0.0,
            },
            patterns: Patterns::default(),
        }
    }
}

// --- Final result ---

/// Everything one invocation produced. Owned by the orchestrator and
/// rebuilt from scratch on every run; nothing carries over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub run_id: String,
    /// Distinct URLs in first-occurrence order.
    pub urls: Vec<String>,
    pub occurrences: HashMap<String, u32>,
    pub classified: Vec<ClassifiedUrl>,
    /// Resolved archive metadata keyed by archive URL.
    pub records: HashMap<String, ArchiveRecord>,
    pub resolution: ResolutionSummary,
    pub archive_series: DateSeries,
    pub tweet_series: DateSeries,
    pub archive: SeriesAnalytics,
    pub tweet: SeriesAnalytics,
}

impl AnalysisResult {
    pub fn urls_in(&self, category: Category) -> impl Iterator<Item = &ClassifiedUrl> {
        self.classified.iter().filter(move |c| c.category == category)
    }

    pub fn count_in(&self, category: Category) -> usize {
        self.urls_in(category).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_sorts_by_parsed_date_not_string() {
        let mut series = DateSeries::new();
        series.increment("Feb 2023".into());
        series.increment("Jan 2023".into());
        series.increment("Dec 2022".into());

        let labels: Vec<&str> = series.ordered().into_iter().map(|(l, _)| l).collect();
        // Lexical order would be ["Dec 2022", "Feb 2023", "Jan 2023"].
        assert_eq!(labels, vec!["Dec 2022", "Jan 2023", "Feb 2023"]);
    }

    #[test]
    fn unparseable_buckets_sort_last() {
        let mut series = DateSeries::new();
        series.increment("garbage".into());
        series.increment("Jan 2023".into());

        let labels: Vec<&str> = series.ordered().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Jan 2023", "garbage"]);
    }

    #[test]
    fn increment_accumulates() {
        let mut series = DateSeries::new();
        series.increment("Jan 2023".into());
        series.increment("Jan 2023".into());
        assert_eq!(series.get("Jan 2023"), Some(2));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn zero_slope_reports_decreasing() {
        let trend = Trend {
            slope: 0.0,
            intercept: 3.0,
        };
        assert_eq!(trend.direction(), TrendDirection::Decreasing);
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::SocialStatus).unwrap();
        assert_eq!(json, "\"social_status\"");
    }
}

//! Plain-text and CSV rendering of an analysis result.

use std::io;

use linkpulse_common::{AnalysisResult, Category, SeriesAnalytics};

use crate::stats::{cumulative, moving_average};

/// Text report over a finished run. With `archive_only` set, the per-URL
/// listing is limited to archived URLs.
pub struct Report<'a> {
    result: &'a AnalysisResult,
    archive_only: bool,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a AnalysisResult, archive_only: bool) -> Self {
        Self {
            result,
            archive_only,
        }
    }
}

impl std::fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = self.result;

        writeln!(f, "\n=== URL Analysis ===")?;
        writeln!(
            f,
            "URLs found:        {} distinct ({} total matches)",
            r.urls.len(),
            r.occurrences.values().sum::<u32>()
        )?;
        writeln!(f, "Archived:          {}", r.count_in(Category::Archived))?;
        writeln!(f, "Social status:     {}", r.count_in(Category::SocialStatus))?;
        writeln!(f, "Plain:             {}", r.count_in(Category::Plain))?;

        let res = &r.resolution;
        write!(
            f,
            "Resolution:        {} resolved, {} unresolved ({} batches ok, {} failed)",
            res.urls_resolved, res.urls_unresolved, res.batches_succeeded, res.batches_failed
        )?;
        if res.cancelled {
            write!(f, " [cancelled]")?;
        }
        writeln!(f)?;

        if !r.archive_series.is_empty() {
            writeln!(f, "\nArchive snapshots by month:")?;
            write_series(f, &r.archive_series)?;
            write_analytics(f, &r.archive)?;
        }

        if !r.tweet_series.is_empty() {
            writeln!(f, "\nTweet dates by month:")?;
            write_series(f, &r.tweet_series)?;
            write_analytics(f, &r.tweet)?;
        }

        writeln!(f, "\nArchived URLs:")?;
        for classified in r.urls_in(Category::Archived) {
            match r.records.get(&classified.url) {
                Some(record) => {
                    let date = record
                        .archive_date
                        .map(|d| d.format("%d %b %Y").to_string())
                        .unwrap_or_else(|| "no date".to_string());
                    writeln!(f, "  {}  (archived: {})", classified.url, date)?;
                }
                None => writeln!(f, "  {}  (unresolved)", classified.url)?,
            }
        }

        if !self.archive_only {
            writeln!(f, "\nOther URLs:")?;
            for classified in r
                .classified
                .iter()
                .filter(|c| c.category != Category::Archived)
            {
                writeln!(f, "  {}  [{}]", classified.url, classified.category)?;
            }
        }

        Ok(())
    }
}

fn write_series(
    f: &mut std::fmt::Formatter<'_>,
    series: &linkpulse_common::DateSeries,
) -> std::fmt::Result {
    let values = series.values_in_order();
    let smoothed = moving_average(&values, 3);
    let totals = cumulative(&values);

    for (idx, (label, count)) in series.ordered().into_iter().enumerate() {
        writeln!(
            f,
            "  {label:<9} {count:>4}   (avg {:.1}, cumulative {})",
            smoothed[idx], totals[idx]
        )?;
    }
    Ok(())
}

fn write_analytics(f: &mut std::fmt::Formatter<'_>, analytics: &SeriesAnalytics) -> std::fmt::Result {
    match &analytics.stats {
        Some(stats) => {
            writeln!(
                f,
                "  mean {:.2} | median {} | max {} | p95 {} | variance {:.2}",
                stats.mean, stats.median, stats.max, stats.percentile95, stats.variance
            )?;
        }
        None => writeln!(f, "  no data")?,
    }

    writeln!(
        f,
        "  trend: {:.2}/month ({})",
        analytics.trend.slope,
        analytics.trend.direction()
    )?;

    if !analytics.anomalies.is_empty() {
        let mut anomalies: Vec<_> = analytics.anomalies.iter().collect();
        anomalies.sort();
        let rendered: Vec<String> = anomalies
            .into_iter()
            .map(|(label, value)| format!("{label} ({value})"))
            .collect();
        writeln!(f, "  anomalies: {}", rendered.join(", "))?;
    }

    let mut patterns = Vec::new();
    if analytics.patterns.rapid_increase {
        patterns.push("rapid increase");
    }
    if analytics.patterns.seasonality {
        patterns.push("seasonality");
    }
    if !patterns.is_empty() {
        writeln!(f, "  patterns: {}", patterns.join(", "))?;
    }

    Ok(())
}

/// CSV rows for every classified URL, with resolved dates where known.
pub fn write_csv<W: io::Write>(result: &AnalysisResult, out: &mut W) -> io::Result<()> {
    writeln!(out, "Category,URL,Archive Date,Tweet Date")?;
    for classified in &result.classified {
        let record = result.records.get(&classified.url);
        let archive_date = record
            .and_then(|r| r.archive_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let content_date = record
            .and_then(|r| r.content_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "\"{}\",\"{}\",{},{}",
            classified.category, classified.url, archive_date, content_date
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use linkpulse_common::{
        ArchiveRecord, ClassifiedUrl, DateSeries, ResolutionSummary,
    };

    use crate::stats::analyze_series;

    fn sample_result() -> AnalysisResult {
        let archive_url = "https://archive.ph/AbC12".to_string();
        let plain_url = "https://example.com/a".to_string();

        let mut records = HashMap::new();
        records.insert(
            archive_url.clone(),
            ArchiveRecord {
                archive_url: archive_url.clone(),
                original_url: Some("https://x.com/u/status/1".into()),
                archive_date: NaiveDate::from_ymd_opt(2023, 1, 9),
                content_date: NaiveDate::from_ymd_opt(2023, 1, 8),
            },
        );

        let mut archive_series = DateSeries::new();
        archive_series.increment("Jan 2023".into());

        AnalysisResult {
            run_id: "test".into(),
            urls: vec![archive_url.clone(), plain_url.clone()],
            occurrences: HashMap::from([(archive_url.clone(), 1), (plain_url.clone(), 2)]),
            classified: vec![
                ClassifiedUrl {
                    url: archive_url,
                    category: Category::Archived,
                },
                ClassifiedUrl {
                    url: plain_url,
                    category: Category::Plain,
                },
            ],
            records,
            resolution: ResolutionSummary {
                batches_succeeded: 1,
                urls_resolved: 1,
                ..Default::default()
            },
            archive: analyze_series(&archive_series),
            archive_series,
            tweet_series: DateSeries::new(),
            tweet: Default::default(),
        }
    }

    #[test]
    fn report_mentions_counts_and_dates() {
        let result = sample_result();
        let text = Report::new(&result, false).to_string();
        assert!(text.contains("2 distinct (3 total matches)"));
        assert!(text.contains("Archived:          1"));
        assert!(text.contains("archived: 09 Jan 2023"));
        assert!(text.contains("https://example.com/a"));
    }

    #[test]
    fn archive_only_hides_other_urls() {
        let result = sample_result();
        let text = Report::new(&result, true).to_string();
        assert!(!text.contains("Other URLs"));
        assert!(text.contains("Archived URLs"));
    }

    #[test]
    fn csv_has_header_and_dates() {
        let result = sample_result();
        let mut out = Vec::new();
        write_csv(&result, &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Category,URL,Archive Date,Tweet Date"));
        assert!(csv.contains("\"Archived\",\"https://archive.ph/AbC12\",2023-01-09,2023-01-08"));
        assert!(csv.contains("\"Plain\",\"https://example.com/a\",,"));
    }
}

//! The scan pipeline: Extract → Classify → Resolve → Compute.
//!
//! The orchestrator owns sequencing and the phase state machine; the
//! stages themselves live in their own modules and know nothing about
//! each other. Progress flows out through a [`ProgressSink`].

pub mod events;
pub mod state;

pub use events::{LogSink, NullSink, ProgressSink, ScanEvent};
pub use state::{Phase, ScanContext};

use std::sync::{Arc, LazyLock};

use regex::Regex;

use linkpulse_common::{
    parse_flexible_date, AnalysisResult, Category, ClassifiedUrl, DateSeries, LinkPulseError,
};

use crate::classify::{classify, snapshot_timestamp};
use crate::extract::extract_urls;
use crate::resolve::{resolve_batches, CancelToken, MetadataFetcher, ResolutionOutcome};
use crate::stats::analyze_series;

/// Pasted threads often annotate tweets with a `Tweet Date:` line; those
/// feed the tweet series alongside service-provided content dates.
static TWEET_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Tweet Date: ([^\n]+)").unwrap());

/// A terminal failure, carrying whatever the run computed before it
/// stopped; a failed resolution never erases a successful extraction.
#[derive(Debug)]
pub struct ScanFailure {
    pub error: LinkPulseError,
    pub context: ScanContext,
}

impl std::fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ScanFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct Scanner {
    fetcher: Arc<dyn MetadataFetcher>,
    sink: Arc<dyn ProgressSink>,
    batch_size: usize,
}

impl Scanner {
    pub fn new(
        fetcher: Arc<dyn MetadataFetcher>,
        sink: Arc<dyn ProgressSink>,
        batch_size: usize,
    ) -> Self {
        Self {
            fetcher,
            sink,
            batch_size,
        }
    }

    /// Run the full pipeline over one batch of pasted text.
    ///
    /// The context is built fresh here and discarded with the result;
    /// calling `analyze` again starts over from nothing.
    pub async fn analyze(
        &self,
        input: &str,
        cancel: &CancelToken,
    ) -> Result<AnalysisResult, ScanFailure> {
        let mut ctx = ScanContext::new();

        // --- Extracting ---
        self.enter(&mut ctx, Phase::Extracting);
        if input.trim().is_empty() {
            return Err(self.fail(ctx, Phase::Extracting, LinkPulseError::EmptyInput));
        }
        let extracted = extract_urls(input);
        self.sink.emit(ScanEvent::UrlsExtracted {
            distinct: extracted.urls.len() as u32,
            total_matches: extracted.total_matches(),
        });
        let no_urls = extracted.is_empty();
        ctx.extracted = Some(extracted);
        if no_urls {
            return Err(self.fail(ctx, Phase::Extracting, LinkPulseError::NoUrlsFound));
        }
        self.complete(Phase::Extracting);

        // --- Classifying ---
        self.enter(&mut ctx, Phase::Classifying);
        let urls = ctx.extracted.as_ref().expect("set above").urls.clone();
        ctx.classified = urls
            .iter()
            .map(|url| ClassifiedUrl {
                url: url.clone(),
                category: classify(url),
            })
            .collect();
        let count = |cat: Category| {
            ctx.classified
                .iter()
                .filter(|c| c.category == cat)
                .count() as u32
        };
        self.sink.emit(ScanEvent::UrlsClassified {
            archived: count(Category::Archived),
            social_status: count(Category::SocialStatus),
            plain: count(Category::Plain),
        });
        self.complete(Phase::Classifying);

        // --- Resolving ---
        self.enter(&mut ctx, Phase::Resolving);
        let archived: Vec<String> = ctx
            .classified
            .iter()
            .filter(|c| c.category == Category::Archived)
            .map(|c| c.url.clone())
            .collect();
        let outcome = resolve_batches(
            self.fetcher.as_ref(),
            &archived,
            self.batch_size,
            cancel,
            self.sink.as_ref(),
        )
        .await;
        ctx.resolution = Some(outcome);
        self.complete(Phase::Resolving);

        // --- Computing ---
        self.enter(&mut ctx, Phase::Computing);
        let resolution = ctx.resolution.as_ref().expect("set above");
        ctx.archive_series = build_archive_series(&urls, resolution);
        ctx.tweet_series = build_tweet_series(input, resolution);

        let archive = analyze_series(&ctx.archive_series);
        let tweet = analyze_series(&ctx.tweet_series);
        self.complete(Phase::Computing);

        ctx.phase = Phase::Done;
        let extracted = ctx.extracted.take().expect("set above");
        let resolution = ctx.resolution.take().expect("set above");
        Ok(AnalysisResult {
            run_id: ctx.run_id,
            urls: extracted.urls,
            occurrences: extracted.occurrences,
            classified: ctx.classified,
            records: resolution.records,
            resolution: resolution.summary,
            archive_series: ctx.archive_series,
            tweet_series: ctx.tweet_series,
            archive,
            tweet,
        })
    }

    fn enter(&self, ctx: &mut ScanContext, phase: Phase) {
        ctx.phase = phase;
        self.sink.emit(ScanEvent::PhaseStarted { phase });
    }

    fn complete(&self, phase: Phase) {
        self.sink.emit(ScanEvent::PhaseCompleted { phase });
    }

    fn fail(&self, mut ctx: ScanContext, phase: Phase, error: LinkPulseError) -> ScanFailure {
        ctx.phase = Phase::Error;
        self.sink.emit(ScanEvent::ScanFailed {
            phase,
            error: error.to_string(),
        });
        ScanFailure { error, context: ctx }
    }
}

/// Archive dates bucketed by month. Service dates are authoritative; the
/// timestamp embedded in a classic-format snapshot path fills in only
/// where the service provided nothing.
fn build_archive_series(urls: &[String], resolution: &ResolutionOutcome) -> DateSeries {
    let mut series = DateSeries::new();

    for record in resolution.records.values() {
        if let Some(date) = record.archive_date {
            series.add_date(date);
        }
    }

    for url in urls {
        let has_service_date = resolution
            .records
            .get(url)
            .is_some_and(|r| r.archive_date.is_some());
        if has_service_date {
            continue;
        }
        if let Some(ts) = snapshot_timestamp(url) {
            series.add_date(ts.date());
        }
    }

    series
}

/// Tweet dates bucketed by month: content dates from resolved records
/// plus any `Tweet Date:` annotations in the pasted text.
fn build_tweet_series(input: &str, resolution: &ResolutionOutcome) -> DateSeries {
    let mut series = DateSeries::new();

    for record in resolution.records.values() {
        if let Some(date) = record.content_date {
            series.add_date(date);
        }
    }

    for caps in TWEET_DATE_RE.captures_iter(input) {
        if let Some(date) = parse_flexible_date(&caps[1]) {
            series.add_date(date);
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use linkpulse_common::ArchiveRecord;

    fn record(url: &str, archive: Option<(i32, u32, u32)>, content: Option<(i32, u32, u32)>) -> ArchiveRecord {
        ArchiveRecord {
            archive_url: url.to_string(),
            original_url: None,
            archive_date: archive.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            content_date: content.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    #[test]
    fn archive_series_prefers_service_dates() {
        let url = "https://archive.ph/20230315000000/http://x.com/".to_string();
        let mut resolution = ResolutionOutcome::default();
        resolution
            .records
            .insert(url.clone(), record(&url, Some((2023, 6, 1)), None));

        // Service said June; the embedded timestamp says March. June wins.
        let series = build_archive_series(&[url], &resolution);
        assert_eq!(series.get("Jun 2023"), Some(1));
        assert_eq!(series.get("Mar 2023"), None);
    }

    #[test]
    fn archive_series_falls_back_to_embedded_timestamp() {
        let url = "https://archive.ph/20230315000000/http://x.com/".to_string();
        let resolution = ResolutionOutcome::default();

        let series = build_archive_series(&[url], &resolution);
        assert_eq!(series.get("Mar 2023"), Some(1));
    }

    #[test]
    fn tweet_series_merges_annotations_and_content_dates() {
        let url = "https://archive.ph/AbC12".to_string();
        let mut resolution = ResolutionOutcome::default();
        resolution
            .records
            .insert(url.clone(), record(&url, None, Some((2022, 1, 9))));

        let input = "Tweet Date: 9 Jan 2022\nTweet Date: 2022-02-01\nTweet Date: nonsense";
        let series = build_tweet_series(input, &resolution);
        assert_eq!(series.get("Jan 2022"), Some(2));
        assert_eq!(series.get("Feb 2022"), Some(1));
        assert_eq!(series.len(), 2);
    }
}

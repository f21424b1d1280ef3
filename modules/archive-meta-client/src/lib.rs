//! HTTP client for the archive metadata service.
//!
//! The service answers batch lookups in two different shapes depending on
//! the handler version: a detailed `archived_urls` list, or a flat
//! `results` map of URL → date. Both are decoded here, at the boundary,
//! into [`ArchiveRecord`], so nothing downstream branches on wire shape.

pub mod error;

pub use error::{ArchiveMetaError, Result};

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use linkpulse_common::{parse_flexible_date, ArchiveRecord};

pub struct ArchiveMetaClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArchiveMetaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a batch of archive URLs (at most 50) to their metadata.
    pub async fn batch_metadata(&self, urls: &[String]) -> Result<Vec<ArchiveRecord>> {
        let endpoint = format!("{}/batch-metadata", self.base_url);
        let body = serde_json::json!({ "urls": urls });

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ArchiveMetaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        normalize_batch(&text)
    }

    /// Look up a single snapshot by its archive ID.
    pub async fn archive_metadata(&self, archive_id: &str) -> Result<ArchiveLookup> {
        let endpoint = format!("{}/archive-metadata/{}", self.base_url, archive_id);

        let resp = self.client.get(&endpoint).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ArchiveMetaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let wire: WireLookup = serde_json::from_str(&text)?;
        if let Some(message) = wire.error {
            return Err(ArchiveMetaError::Service(message));
        }

        Ok(ArchiveLookup {
            original_url: wire.original_url,
            archive_date: wire.archive_date.as_deref().and_then(parse_flexible_date),
            content_date: wire.content_date.as_deref().and_then(parse_flexible_date),
        })
    }

    /// Ask the service to create a new snapshot of a URL.
    /// Returns the archive URL of the snapshot.
    pub async fn create_archive(&self, url: &str) -> Result<String> {
        let endpoint = format!("{}/create-archive", self.base_url);
        let body = serde_json::json!({ "url": url });

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ArchiveMetaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let wire: WireCreated = serde_json::from_str(&text)?;
        Ok(wire.archive_url)
    }

    /// Single health probe. True when the service answered 2xx.
    pub async fn health(&self) -> bool {
        let endpoint = format!("{}/health", self.base_url);
        match self.client.get(&endpoint).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Metadata of a single snapshot lookup. Unlike [`ArchiveRecord`] the
/// archive URL is not echoed back; the caller already has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLookup {
    pub original_url: Option<String>,
    pub archive_date: Option<chrono::NaiveDate>,
    pub content_date: Option<chrono::NaiveDate>,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// The two observed batch response shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireBatch {
    Detailed {
        archived_urls: Vec<WireRecord>,
    },
    Dates {
        results: HashMap<String, Option<String>>,
    },
}

#[derive(Deserialize)]
struct WireRecord {
    #[serde(alias = "archiveUrl")]
    archive_url: Option<String>,
    #[serde(alias = "originalUrl")]
    original_url: Option<String>,
    #[serde(alias = "archiveDate")]
    archive_date: Option<String>,
    #[serde(alias = "contentDate", alias = "tweet_date", alias = "tweetDate")]
    content_date: Option<String>,
}

#[derive(Deserialize)]
struct WireLookup {
    #[serde(alias = "originalUrl")]
    original_url: Option<String>,
    #[serde(alias = "archiveDate")]
    archive_date: Option<String>,
    #[serde(alias = "contentDate", alias = "tweet_date", alias = "tweetDate")]
    content_date: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct WireCreated {
    #[serde(rename = "archiveUrl", alias = "archive_url")]
    archive_url: String,
}

/// Decode either batch shape into records. Entries without an archive URL
/// cannot be keyed and are dropped.
fn normalize_batch(body: &str) -> Result<Vec<ArchiveRecord>> {
    let wire: WireBatch = serde_json::from_str(body)?;

    let records = match wire {
        WireBatch::Detailed { archived_urls } => archived_urls
            .into_iter()
            .filter_map(|rec| {
                let Some(archive_url) = rec.archive_url else {
                    debug!("dropping batch entry without archive_url");
                    return None;
                };
                Some(ArchiveRecord {
                    archive_url,
                    original_url: rec.original_url,
                    archive_date: rec.archive_date.as_deref().and_then(parse_flexible_date),
                    content_date: rec.content_date.as_deref().and_then(parse_flexible_date),
                })
            })
            .collect(),
        WireBatch::Dates { results } => results
            .into_iter()
            .map(|(url, date)| ArchiveRecord {
                archive_url: url,
                original_url: None,
                archive_date: date.as_deref().and_then(parse_flexible_date),
                content_date: None,
            })
            .collect(),
    };

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn decodes_detailed_shape() {
        let body = r#"{
            "archived_urls": [
                {
                    "archive_url": "https://archive.ph/AbC12",
                    "original_url": "https://x.com/u/status/1",
                    "archive_date": "9 Jan 2022",
                    "content_date": "2022-01-08"
                },
                { "original_url": "https://example.com/orphan" }
            ]
        }"#;

        let records = normalize_batch(body).unwrap();
        assert_eq!(records.len(), 1, "entry without archive_url is dropped");
        let rec = &records[0];
        assert_eq!(rec.archive_url, "https://archive.ph/AbC12");
        assert_eq!(rec.original_url.as_deref(), Some("https://x.com/u/status/1"));
        assert_eq!(rec.archive_date, NaiveDate::from_ymd_opt(2022, 1, 9));
        assert_eq!(rec.content_date, NaiveDate::from_ymd_opt(2022, 1, 8));
    }

    #[test]
    fn decodes_flat_results_shape() {
        let body = r#"{
            "results": {
                "https://archive.ph/AbC12": "2023-02-17",
                "https://archive.ph/XyZ99": null
            }
        }"#;

        let mut records = normalize_batch(body).unwrap();
        records.sort_by(|a, b| a.archive_url.cmp(&b.archive_url));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].archive_date, NaiveDate::from_ymd_opt(2023, 2, 17));
        // Present record with null date: resolved, but no date known.
        assert_eq!(records[1].archive_date, None);
        assert!(records.iter().all(|r| r.original_url.is_none()));
    }

    #[test]
    fn accepts_camel_case_aliases() {
        let body = r#"{
            "archived_urls": [
                {
                    "archiveUrl": "https://archive.ph/AbC12",
                    "originalUrl": "https://example.com",
                    "archiveDate": "01/09/2022"
                }
            ]
        }"#;

        let records = normalize_batch(body).unwrap();
        assert_eq!(records[0].archive_url, "https://archive.ph/AbC12");
        assert_eq!(records[0].archive_date, NaiveDate::from_ymd_opt(2022, 1, 9));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = normalize_batch("not json").unwrap_err();
        assert!(matches!(err, ArchiveMetaError::Decode(_)));

        // Valid JSON in neither shape is also a decode error.
        let err = normalize_batch(r#"{"unexpected": true}"#).unwrap_err();
        assert!(matches!(err, ArchiveMetaError::Decode(_)));
    }

    #[test]
    fn unparseable_dates_become_none() {
        let body = r#"{ "results": { "https://archive.ph/AbC12": "soonish" } }"#;
        let records = normalize_batch(body).unwrap();
        assert_eq!(records[0].archive_date, None);
    }
}

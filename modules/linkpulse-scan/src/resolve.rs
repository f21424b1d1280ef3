//! Batched resolution of archived URLs against the metadata service.
//!
//! Batches are issued strictly sequentially (each call is awaited before
//! the next goes out), so the service never sees more than one in-flight
//! request from a run. The batch size, not concurrency, is the throttle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use archive_meta_client::ArchiveMetaClient;
use linkpulse_common::{ArchiveRecord, Config, ResolutionSummary};

use crate::pipeline::events::{ProgressSink, ScanEvent};

/// Metadata lookups behind one trait, so tests can run the whole pipeline
/// against a scripted fetcher: no network, no service.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Resolve one batch of archive URLs to their metadata records.
    async fn batch_metadata(&self, urls: &[String]) -> Result<Vec<ArchiveRecord>>;
}

#[async_trait]
impl MetadataFetcher for ArchiveMetaClient {
    async fn batch_metadata(&self, urls: &[String]) -> Result<Vec<ArchiveRecord>> {
        Ok(ArchiveMetaClient::batch_metadata(self, urls).await?)
    }
}

/// Build the production client from configuration.
pub fn client_from_config(config: &Config) -> ArchiveMetaClient {
    ArchiveMetaClient::new(
        &config.api_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )
}

/// Cooperative cancellation flag, checked before each batch is issued.
/// Cancelling never interrupts an in-flight call; it only stops new ones.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Records merged across all successful batches, keyed by archive URL.
/// Map order carries no meaning.
#[derive(Debug, Default)]
pub struct ResolutionOutcome {
    pub records: HashMap<String, ArchiveRecord>,
    pub summary: ResolutionSummary,
}

/// Resolve `urls` in contiguous input-order batches of `batch_size`.
///
/// A failed batch is logged, counted, and skipped: its URLs simply never
/// get a record, and later batches still run. Progress is reported through
/// the sink after every batch, failed ones included.
pub async fn resolve_batches(
    fetcher: &dyn MetadataFetcher,
    urls: &[String],
    batch_size: usize,
    cancel: &CancelToken,
    sink: &dyn ProgressSink,
) -> ResolutionOutcome {
    let mut outcome = ResolutionOutcome::default();
    if urls.is_empty() {
        return outcome;
    }

    let total = urls.len();
    let total_batches = urls.len().div_ceil(batch_size) as u32;
    let mut processed = 0usize;

    for (index, batch) in urls.chunks(batch_size).enumerate() {
        if cancel.is_cancelled() {
            outcome.summary.cancelled = true;
            sink.emit(ScanEvent::ResolutionCancelled {
                skipped: (total - processed) as u32,
            });
            break;
        }

        let index = index as u32 + 1;
        match fetcher.batch_metadata(batch).await {
            Ok(records) => {
                let resolved = records.len() as u32;
                for record in records {
                    outcome.records.insert(record.archive_url.clone(), record);
                }
                outcome.summary.batches_succeeded += 1;
                sink.emit(ScanEvent::BatchResolved {
                    index,
                    total_batches,
                    resolved,
                    ok: true,
                });
            }
            Err(error) => {
                warn!(batch = index, urls = batch.len(), %error, "batch lookup failed, skipping");
                outcome.summary.batches_failed += 1;
                sink.emit(ScanEvent::BatchResolved {
                    index,
                    total_batches,
                    resolved: 0,
                    ok: false,
                });
            }
        }

        processed += batch.len();
        sink.emit(ScanEvent::ResolutionProgress {
            processed: processed as u32,
            total: total as u32,
        });
    }

    outcome.summary.urls_resolved = urls
        .iter()
        .filter(|url| outcome.records.contains_key(*url))
        .count() as u32;
    outcome.summary.urls_unresolved = total as u32 - outcome.summary.urls_resolved;
    outcome
}

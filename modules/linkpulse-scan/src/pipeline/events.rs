//! Progress events for one scan run.
//!
//! The orchestrator and resolver emit `ScanEvent`s through a `ProgressSink`
//! observer; what a sink does with them (log lines, a progress bar, a test
//! recording) is not this module's concern.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pipeline::state::Phase;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    // Phase lifecycle
    PhaseStarted {
        phase: Phase,
    },
    PhaseCompleted {
        phase: Phase,
    },

    // Extraction / classification
    UrlsExtracted {
        distinct: u32,
        total_matches: u32,
    },
    UrlsClassified {
        archived: u32,
        social_status: u32,
        plain: u32,
    },

    // Batched resolution
    BatchResolved {
        index: u32,
        total_batches: u32,
        resolved: u32,
        ok: bool,
    },
    /// Cumulative URLs handed to the service so far, for percent-complete
    /// displays. Emitted after every batch, failed ones included.
    ResolutionProgress {
        processed: u32,
        total: u32,
    },
    ResolutionCancelled {
        skipped: u32,
    },

    // Terminal failure
    ScanFailed {
        phase: Phase,
        error: String,
    },
}

impl ScanEvent {
    pub fn variant_name(&self) -> &'static str {
        match self {
            ScanEvent::PhaseStarted { .. } => "phase_started",
            ScanEvent::PhaseCompleted { .. } => "phase_completed",
            ScanEvent::UrlsExtracted { .. } => "urls_extracted",
            ScanEvent::UrlsClassified { .. } => "urls_classified",
            ScanEvent::BatchResolved { .. } => "batch_resolved",
            ScanEvent::ResolutionProgress { .. } => "resolution_progress",
            ScanEvent::ResolutionCancelled { .. } => "resolution_cancelled",
            ScanEvent::ScanFailed { .. } => "scan_failed",
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ScanEvent);
}

/// Sink that narrates progress through tracing. The default for the CLI.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: ScanEvent) {
        match &event {
            ScanEvent::PhaseStarted { phase } => info!(%phase, "phase started"),
            ScanEvent::PhaseCompleted { phase } => info!(%phase, "phase completed"),
            ScanEvent::UrlsExtracted {
                distinct,
                total_matches,
            } => info!(distinct, total_matches, "urls extracted"),
            ScanEvent::UrlsClassified {
                archived,
                social_status,
                plain,
            } => info!(archived, social_status, plain, "urls classified"),
            ScanEvent::BatchResolved {
                index,
                total_batches,
                resolved,
                ok,
            } => {
                if *ok {
                    info!(index, total_batches, resolved, "batch resolved");
                } else {
                    warn!(index, total_batches, "batch failed, continuing");
                }
            }
            ScanEvent::ResolutionProgress { processed, total } => {
                let percent = if *total == 0 {
                    100.0
                } else {
                    (*processed as f64 / *total as f64 * 100.0).round()
                };
                info!(processed, total, percent, "resolution progress");
            }
            ScanEvent::ResolutionCancelled { skipped } => {
                warn!(skipped, "resolution cancelled, remaining urls skipped")
            }
            ScanEvent::ScanFailed { phase, error } => warn!(%phase, error, "scan failed"),
        }
    }
}

/// Sink that drops everything, for callers that want no narration.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ScanEvent) {}
}

//! Per-invocation scan state.
//!
//! Every `analyze` call builds a fresh `ScanContext`; there is no shared
//! module state, so repeated or interleaved invocations cannot
//! cross-contaminate. Whatever a failed run managed to compute stays on
//! the context for inspection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use linkpulse_common::{ClassifiedUrl, DateSeries, ExtractedUrls};

use crate::resolve::ResolutionOutcome;

/// Where a run currently stands. `Error` is terminal and reachable from
/// any working phase; a new invocation always starts at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Extracting,
    Classifying,
    Resolving,
    Computing,
    Done,
    Error,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Extracting => write!(f, "extracting"),
            Phase::Classifying => write!(f, "classifying"),
            Phase::Resolving => write!(f, "resolving"),
            Phase::Computing => write!(f, "computing"),
            Phase::Done => write!(f, "done"),
            Phase::Error => write!(f, "error"),
        }
    }
}

/// Accumulated results of one run. Fields fill in as phases complete.
#[derive(Debug, Default)]
pub struct ScanContext {
    pub run_id: String,
    pub phase: Phase,
    pub extracted: Option<ExtractedUrls>,
    pub classified: Vec<ClassifiedUrl>,
    pub resolution: Option<ResolutionOutcome>,
    pub archive_series: DateSeries,
    pub tweet_series: DateSeries,
}

impl ScanContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_starts_idle_and_empty() {
        let ctx = ScanContext::new();
        assert_eq!(ctx.phase, Phase::Idle);
        assert!(ctx.extracted.is_none());
        assert!(ctx.classified.is_empty());
        assert!(ctx.resolution.is_none());
        assert!(!ctx.run_id.is_empty());
    }

    #[test]
    fn contexts_are_independent() {
        let a = ScanContext::new();
        let b = ScanContext::new();
        assert_ne!(a.run_id, b.run_id);
    }
}

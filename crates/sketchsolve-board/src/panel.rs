//! The result panel with its overlap guard.
//!
//! Nothing stops a user from hitting Calculate twice while the first request
//! is still in flight. The panel resolves races by generation: the latest
//! submission wins, and completions from older submissions are dropped
//! instead of overwriting newer state.

use chrono::{DateTime, Utc};
use tracing::debug;

use sketchsolve_core::protocol::ResultEntry;

/// Ties an in-flight analysis to the panel generation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Outcome of one analysis submission.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Entries(Vec<ResultEntry>),
    Error(String),
}

#[derive(Debug, Default)]
pub struct ResultPanel {
    generation: u64,
    current: Option<AnalysisOutcome>,
    updated_at: Option<DateTime<Utc>>,
}

impl ResultPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new submission. Tokens from earlier submissions become
    /// stale.
    pub fn begin_request(&mut self) -> RequestToken {
        self.generation += 1;
        RequestToken(self.generation)
    }

    /// Apply a completed analysis. Returns false when the token is stale
    /// and the outcome was dropped.
    pub fn complete(&mut self, token: RequestToken, outcome: AnalysisOutcome) -> bool {
        if token.0 != self.generation {
            debug!(
                token = token.0,
                generation = self.generation,
                "Dropping stale analysis outcome"
            );
            return false;
        }
        self.current = Some(outcome);
        self.updated_at = Some(Utc::now());
        true
    }

    /// Drop the displayed outcome and invalidate in-flight requests.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.current = None;
        self.updated_at = None;
    }

    pub fn current(&self) -> Option<&AnalysisOutcome> {
        self.current.as_ref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

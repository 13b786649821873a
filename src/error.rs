//! Error taxonomy for the scrape pipeline.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the scrape pipeline.
///
/// Only `InvalidFilters`, an index-level `Transport`, and the run-budget
/// `Timeout` abort a run. Reference and field level failures are handled
/// where they occur and never escalate past the owning extraction call.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The filter spec cannot produce a valid query. Raised before any I/O.
    #[error("invalid filters: {0}")]
    InvalidFilters(String),

    /// Network or navigation failure loading a page.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// A bounded wait expired before the expected content appeared.
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),
}

impl ScrapeError {
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport { url: url.into(), reason: reason.to_string() }
    }

    /// True when a failure only affects a single reference and the batch can
    /// continue without it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout(..))
    }
}

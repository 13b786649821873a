//! Scrape pipeline: filters → query URL → index → detail extraction.

use crate::config::Config;
use crate::error::ScrapeError;
use crate::immoweb::client::FetchPage;
use crate::immoweb::detail::DetailExtractor;
use crate::immoweb::index::IndexFetcher;
use crate::immoweb::models::Snapshot;
use crate::immoweb::query::{FilterSpec, QueryBuilder};
use std::time::Duration;
use tracing::{info, warn};

/// A reference that failed extraction, with the reason it was skipped.
#[derive(Debug, Clone)]
pub struct SkippedRef {
    pub url: String,
    pub reason: String,
}

/// Result of one pipeline run: the snapshot plus a partial-failure report.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub snapshot: Snapshot,
    /// References the index stage produced.
    pub attempted: usize,
    /// References that failed detail extraction.
    pub skipped: Vec<SkippedRef>,
}

impl ScrapeOutcome {
    pub fn extracted(&self) -> usize {
        self.snapshot.len()
    }
}

/// Sequential scrape pipeline over an abstract page fetcher.
///
/// Strictly one reference at a time: listing pages are heavyweight to serve
/// and the site should not be fanned out against. Pacing between consecutive
/// requests lives in the fetcher.
pub struct Pipeline<'a, F: FetchPage> {
    fetcher: &'a F,
    query_builder: QueryBuilder,
    index: IndexFetcher,
    detail: DetailExtractor,
    max_results: usize,
}

impl<'a, F: FetchPage> Pipeline<'a, F> {
    pub fn new(fetcher: &'a F, config: &Config) -> Self {
        Self {
            fetcher,
            query_builder: QueryBuilder::new(
                config.base_url.clone(),
                config.default_categories.clone(),
                config.default_transaction,
            ),
            index: IndexFetcher::new(
                Duration::from_millis(config.wait_timeout_ms),
                Duration::from_millis(config.poll_interval_ms),
            ),
            detail: DetailExtractor::new(),
            max_results: config.max_results,
        }
    }

    /// Runs one full scrape pass.
    ///
    /// Filter validation and index-level transport failures abort the run;
    /// per-reference failures are recorded and skipped, so the run completes
    /// with a partial snapshot.
    pub async fn run(&self, filters: &FilterSpec) -> Result<ScrapeOutcome, ScrapeError> {
        let query_url = self.query_builder.build(filters)?;
        info!("Scraping {}", query_url);

        let refs = self.index.fetch(self.fetcher, &query_url, self.max_results).await?;
        let attempted = refs.len();
        info!("Index produced {} listing references", attempted);

        let mut listings = Vec::with_capacity(attempted);
        let mut skipped = Vec::new();

        for reference in &refs {
            match self.detail.fetch_and_extract(self.fetcher, reference).await {
                Ok(listing) => listings.push(listing),
                Err(e) => {
                    warn!("Skipping {}: {}", reference.url(), e);
                    skipped.push(SkippedRef { url: reference.url().to_string(), reason: e.to_string() });
                }
            }
        }

        info!("Extracted {}/{} listings ({} skipped)", listings.len(), attempted, skipped.len());

        Ok(ScrapeOutcome { snapshot: Snapshot::new(listings), attempted, skipped })
    }
}

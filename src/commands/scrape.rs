//! Scrape command: run the pipeline and print the snapshot, no side effects.

use crate::config::Config;
use crate::immoweb::client::{FetchPage, ImmowebClient};
use crate::immoweb::query::FilterSpec;
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use tracing::info;

/// Executes a one-off scrape and renders the snapshot as JSON.
pub struct ScrapeCommand {
    config: Config,
}

impl ScrapeCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn execute(&self, filters: &FilterSpec) -> Result<String> {
        let client = ImmowebClient::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_with(&client, filters).await
    }

    /// Runs with an injected fetcher (for testing).
    pub async fn execute_with<F: FetchPage>(
        &self,
        fetcher: &F,
        filters: &FilterSpec,
    ) -> Result<String> {
        let pipeline = Pipeline::new(fetcher, &self.config);
        let outcome = pipeline.run(filters).await?;

        // Counts go to the log; stdout stays valid JSON for piping.
        info!(
            "{} attempted, {} extracted, {} skipped",
            outcome.attempted,
            outcome.extracted(),
            outcome.skipped.len()
        );

        Ok(serde_json::to_string_pretty(&outcome.snapshot)?)
    }
}

//! Watch command: scrape, reconcile against the store, notify.

use crate::config::Config;
use crate::error::ScrapeError;
use crate::immoweb::client::{FetchPage, ImmowebClient};
use crate::immoweb::query::FilterSpec;
use crate::notify::{NoopNotifier, Notifier, TelegramNotifier};
use crate::pipeline::{Pipeline, ScrapeOutcome};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::store::{JsonStore, SnapshotStore};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Executes one full watch run.
pub struct WatchCommand {
    config: Config,
}

impl WatchCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Wires up the shipped collaborators and runs.
    pub async fn execute(&self, filters: &FilterSpec) -> Result<String> {
        let client = ImmowebClient::new(&self.config).context("Failed to create HTTP client")?;
        let store = JsonStore::new(self.config.store_path());

        match (&self.config.telegram_bot_token, &self.config.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                let notifier = TelegramNotifier::new(token, chat_id)
                    .context("Failed to create Telegram notifier")?;
                self.execute_with(&client, &store, &notifier, filters).await
            }
            _ => {
                warn!("Telegram credentials not configured, notifications disabled");
                self.execute_with(&client, &store, &NoopNotifier, filters).await
            }
        }
    }

    /// Runs with injected collaborators (the testing seam).
    ///
    /// Reconciliation only ever sees a completed extraction pass: the
    /// pipeline either returns a full (possibly partial-by-skips) snapshot or
    /// the whole run errors out before any store mutation.
    pub async fn execute_with<F, S, N>(
        &self,
        fetcher: &F,
        store: &S,
        notifier: &N,
        filters: &FilterSpec,
    ) -> Result<String>
    where
        F: FetchPage,
        S: SnapshotStore,
        N: Notifier,
    {
        let pipeline = Pipeline::new(fetcher, &self.config);

        // Hard wall-clock ceiling; a hung fetch cannot stall the run forever.
        let budget = Duration::from_secs(self.config.run_budget_secs);
        let outcome = tokio::time::timeout(budget, pipeline.run(filters))
            .await
            .map_err(|_| ScrapeError::Timeout(budget, "watch run"))??;

        let reconciler = Reconciler::new(store, notifier);
        let result = reconciler.run(&outcome.snapshot).await?;

        info!(
            "Watch run complete: {} extracted, {} new, {} removed",
            outcome.extracted(),
            result.added.len(),
            result.removed.len()
        );

        Ok(render_summary(&outcome, &result))
    }
}

fn render_summary(outcome: &ScrapeOutcome, result: &Reconciliation) -> String {
    let mut out = format!(
        "Extracted {}/{} listings. {} new, {} removed.",
        outcome.extracted(),
        outcome.attempted,
        result.added.len(),
        result.removed.len()
    );

    if !outcome.skipped.is_empty() {
        out.push_str("\nSkipped references:");
        for skipped in &outcome.skipped {
            out.push_str(&format!("\n  {} ({})", skipped.url, skipped.reason));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::immoweb::models::{Listing, Snapshot};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl FetchPage for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
            self.pages.get(url).cloned().ok_or_else(|| ScrapeError::transport(url, "no route"))
        }
    }

    struct MemoryStore {
        stored: Mutex<Vec<Listing>>,
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        async fn load_all(&self) -> Result<Snapshot> {
            Ok(Snapshot::new(self.stored.lock().unwrap().clone()))
        }

        async fn add_all(&self, listings: &[Listing]) -> Result<()> {
            self.stored.lock().unwrap().extend(listings.iter().cloned());
            Ok(())
        }

        async fn delete_all(&self, listings: &[Listing]) -> Result<()> {
            self.stored.lock().unwrap().retain(|l| !listings.contains(l));
            Ok(())
        }
    }

    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), ScrapeError> {
            self.messages.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn test_config() -> Config {
        Config {
            base_url: "https://www.immoweb.be/en/search".to_string(),
            delay_ms: 0,
            delay_jitter_ms: 0,
            wait_timeout_ms: 50,
            poll_interval_ms: 5,
            max_results: 5,
            ..Config::default()
        }
    }

    fn filters() -> FilterSpec {
        FilterSpec { postal_codes: vec![2000], ..Default::default() }
    }

    fn fetcher_for(urls: &[&str]) -> MapFetcher {
        use crate::immoweb::query::QueryBuilder;

        let config = test_config();
        let query_url = QueryBuilder::new(
            config.base_url.clone(),
            config.default_categories.clone(),
            config.default_transaction,
        )
        .build(&filters())
        .unwrap();

        let cards: Vec<String> = urls
            .iter()
            .map(|u| {
                format!(
                    r#"<li class="search-results__item"><a class="card__title-link" href="{}">x</a></li>"#,
                    u
                )
            })
            .collect();
        let index = format!("<html><body><ul>{}</ul></body></html>", cards.join(""));

        let mut pages = HashMap::new();
        pages.insert(query_url, index);
        for u in urls {
            pages.insert(
                format!("https://www.immoweb.be{}", u),
                r#"<html><head><title>Apartment for rent</title></head><body>
                    <p class="classified__price">750 €</p>
                    <div class="classified__information--address-row">Antwerp</div>
                </body></html>"#
                    .to_string(),
            );
        }
        MapFetcher { pages }
    }

    #[tokio::test]
    async fn test_first_run_persists_and_notifies() {
        let fetcher = fetcher_for(&["/c/1", "/c/2"]);
        let store = MemoryStore { stored: Mutex::new(Vec::new()) };
        let notifier = RecordingNotifier { messages: Mutex::new(Vec::new()) };

        let cmd = WatchCommand::new(test_config());
        let summary = cmd.execute_with(&fetcher, &store, &notifier, &filters()).await.unwrap();

        assert!(summary.contains("Extracted 2/2"));
        assert!(summary.contains("2 new"));
        assert_eq!(store.stored.lock().unwrap().len(), 2);
        assert_eq!(notifier.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_run_unchanged_is_quiet() {
        let fetcher = fetcher_for(&["/c/1"]);
        let store = MemoryStore {
            stored: Mutex::new(vec![Listing::new("https://www.immoweb.be/c/1")]),
        };
        let notifier = RecordingNotifier { messages: Mutex::new(Vec::new()) };

        let cmd = WatchCommand::new(test_config());
        let summary = cmd.execute_with(&fetcher, &store, &notifier, &filters()).await.unwrap();

        assert!(summary.contains("0 new"));
        assert!(notifier.messages.lock().unwrap().is_empty());
        assert_eq!(store.stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_skipped_references_appear_in_summary() {
        let mut fetcher = fetcher_for(&["/c/1", "/c/2"]);
        // Break one detail page.
        fetcher.pages.remove("https://www.immoweb.be/c/2");

        let store = MemoryStore { stored: Mutex::new(Vec::new()) };
        let notifier = RecordingNotifier { messages: Mutex::new(Vec::new()) };

        let cmd = WatchCommand::new(test_config());
        let summary = cmd.execute_with(&fetcher, &store, &notifier, &filters()).await.unwrap();

        assert!(summary.contains("Extracted 1/2"));
        assert!(summary.contains("Skipped references:"));
        assert!(summary.contains("https://www.immoweb.be/c/2"));
    }

    #[tokio::test]
    async fn test_run_budget_enforced() {
        struct HangingFetcher;

        #[async_trait]
        impl FetchPage for HangingFetcher {
            async fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!()
            }
        }

        let store = MemoryStore { stored: Mutex::new(Vec::new()) };
        let notifier = RecordingNotifier { messages: Mutex::new(Vec::new()) };

        let mut config = test_config();
        config.run_budget_secs = 0;

        let cmd = WatchCommand::new(config);
        let result = cmd.execute_with(&HangingFetcher, &store, &notifier, &filters()).await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("timed out"));
        assert!(err.contains("watch run"));
        // Nothing was persisted.
        assert!(store.stored.lock().unwrap().is_empty());
    }
}

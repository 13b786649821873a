//! Snapshot reconciliation: diff the fresh scrape against the stored state,
//! persist the difference, notify about newcomers.

use crate::immoweb::models::{Listing, Snapshot};
use crate::notify::Notifier;
use crate::store::SnapshotStore;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Outcome of comparing a new snapshot against the previous one.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Listings whose URL was not in the previous snapshot.
    pub added: Vec<Listing>,
    /// Previously stored listings that vanished from the live search.
    pub removed: Vec<Listing>,
}

impl Reconciliation {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Partitions by URL identity: `added` = new not in previous, `removed` =
/// previous not in new. The two sets are disjoint by construction.
pub fn diff(new: &Snapshot, previous: &Snapshot) -> Reconciliation {
    let previous_urls = previous.urls();
    let new_urls = new.urls();

    let added = new
        .iter()
        .filter(|l| !previous_urls.contains(l.url.as_str()))
        .cloned()
        .collect();

    let removed = previous
        .iter()
        .filter(|l| !new_urls.contains(l.url.as_str()))
        .cloned()
        .collect();

    Reconciliation { added, removed }
}

/// Drives the store and the notification channel from a diff.
pub struct Reconciler<'a, S: SnapshotStore, N: Notifier> {
    store: &'a S,
    notifier: &'a N,
}

impl<'a, S: SnapshotStore, N: Notifier> Reconciler<'a, S, N> {
    pub fn new(store: &'a S, notifier: &'a N) -> Self {
        Self { store, notifier }
    }

    /// Reconciles a freshly scraped snapshot against the stored one.
    ///
    /// First run (empty store): everything is persisted and announced in one
    /// bootstrap message. Later runs: when something new appeared, the added
    /// listings are persisted, vanished ones pruned, and one message sent;
    /// when nothing new appeared, nothing mutates and nothing is sent.
    pub async fn run(&self, new_snapshot: &Snapshot) -> Result<Reconciliation> {
        let previous = self.store.load_all().await.context("Failed to load stored snapshot")?;

        if previous.is_empty() {
            info!("Empty store, bootstrapping with {} listings", new_snapshot.len());

            self.store
                .add_all(&new_snapshot.listings)
                .await
                .context("Failed to persist bootstrap snapshot")?;

            self.notify(&render_message(
                "Initial listings added to the watch list:",
                &new_snapshot.listings,
            ))
            .await;

            return Ok(Reconciliation {
                added: new_snapshot.listings.clone(),
                removed: Vec::new(),
            });
        }

        let result = diff(new_snapshot, &previous);
        info!("Diff: {} added, {} removed", result.added.len(), result.removed.len());

        if result.added.is_empty() {
            info!("No new listings, leaving store untouched");
            return Ok(result);
        }

        self.store.add_all(&result.added).await.context("Failed to persist added listings")?;
        self.store
            .delete_all(&result.removed)
            .await
            .context("Failed to prune vanished listings")?;

        self.notify(&render_message("New listings found:", &result.added)).await;

        Ok(result)
    }

    /// Best-effort send: failures are logged, never retried or propagated.
    async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            warn!("Notification failed (ignored): {}", e);
        }
    }
}

fn render_message(header: &str, listings: &[Listing]) -> String {
    let lines: Vec<String> = listings.iter().map(|l| l.summary_line()).collect();
    format!("{}\n\n{}", header, lines.join("\n\n"))
}

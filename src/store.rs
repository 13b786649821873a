//! Snapshot persistence behind a trait seam.

use crate::immoweb::models::{Listing, Snapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tracing::debug;

/// Full-snapshot store keyed by listing URL.
///
/// The store owns its own consistency guarantees; the pipeline only does one
/// read-then-write sequence per run with no concurrent writers.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads the complete stored snapshot.
    async fn load_all(&self) -> Result<Snapshot>;

    /// Adds listings, keyed by URL. Stamps `first_seen` on first persist.
    async fn add_all(&self, listings: &[Listing]) -> Result<()>;

    /// Deletes the given listings by URL.
    async fn delete_all(&self, listings: &[Listing]) -> Result<()>;
}

/// Single-file JSON store.
///
/// Writes go through a temp file followed by a rename so an interrupted run
/// never leaves a half-written snapshot behind.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<Vec<Listing>> {
        if !self.path.exists() {
            debug!("Store file {} does not exist yet", self.path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read store: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store: {}", self.path.display()))
    }

    fn write(&self, listings: &[Listing]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(listings)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move store into place: {}", self.path.display()))?;
        debug!("Wrote {} listings to {}", listings.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonStore {
    async fn load_all(&self) -> Result<Snapshot> {
        Ok(Snapshot::new(self.read()?))
    }

    async fn add_all(&self, listings: &[Listing]) -> Result<()> {
        let mut stored = self.read()?;
        let now = Utc::now();

        for listing in listings {
            if let Some(existing) = stored.iter_mut().find(|l| l.url == listing.url) {
                // Re-adding a known URL refreshes the fields but keeps the
                // original first_seen.
                let first_seen = existing.first_seen;
                *existing = listing.clone();
                existing.first_seen = first_seen.or(Some(now));
            } else {
                let mut listing = listing.clone();
                listing.first_seen = listing.first_seen.or(Some(now));
                stored.push(listing);
            }
        }

        self.write(&stored)
    }

    async fn delete_all(&self, listings: &[Listing]) -> Result<()> {
        if listings.is_empty() {
            return Ok(());
        }
        let mut stored = self.read()?;
        stored.retain(|l| !listings.iter().any(|d| d.url == l.url));
        self.write(&stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing(url: &str) -> Listing {
        Listing::new(url)
    }

    fn store_in(dir: &TempDir) -> JsonStore {
        JsonStore::new(dir.path().join("snapshot.json"))
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let snapshot = store.load_all().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_add_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add_all(&[listing("https://x/1"), listing("https://x/2")]).await.unwrap();

        let snapshot = store.load_all().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_url("https://x/1"));
    }

    #[tokio::test]
    async fn test_first_seen_stamped_on_first_persist() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add_all(&[listing("https://x/1")]).await.unwrap();

        let snapshot = store.load_all().await.unwrap();
        assert!(snapshot.listings[0].first_seen.is_some());
    }

    #[tokio::test]
    async fn test_readd_keeps_original_first_seen_and_refreshes_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add_all(&[listing("https://x/1")]).await.unwrap();
        let original = store.load_all().await.unwrap().listings[0].first_seen;

        let mut updated = listing("https://x/1");
        updated.price = Some("999 €".into());
        store.add_all(&[updated]).await.unwrap();

        let snapshot = store.load_all().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.listings[0].price.as_deref(), Some("999 €"));
        assert_eq!(snapshot.listings[0].first_seen, original);
    }

    #[tokio::test]
    async fn test_delete_by_url() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add_all(&[listing("https://x/1"), listing("https://x/2")]).await.unwrap();
        store.delete_all(&[listing("https://x/1")]).await.unwrap();

        let snapshot = store.load_all().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_url("https://x/2"));
    }

    #[tokio::test]
    async fn test_delete_empty_set_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add_all(&[listing("https://x/1")]).await.unwrap();
        store.delete_all(&[]).await.unwrap();

        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("nested/deeper/snapshot.json"));

        store.add_all(&[listing("https://x/1")]).await.unwrap();
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_store_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "not json {{").unwrap();

        let store = JsonStore::new(path);
        let result = store.load_all().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse store"));
    }
}

//! Data models for listings, references, and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque locator for a single listing's detail page.
///
/// Produced by the index stage, consumed by the detail stage; lives only
/// within one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRef(pub String);

impl ListingRef {
    pub fn url(&self) -> &str {
        &self.0
    }
}

/// Which side of the market a listing sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Rental,
    Sale,
}

impl TransactionKind {
    /// URL path slug, as Immoweb spells it.
    pub fn slug(&self) -> &'static str {
        match self {
            TransactionKind::Rental => "for-rent",
            TransactionKind::Sale => "for-sale",
        }
    }

    /// The `priceType` query parameter value paired with this kind.
    pub fn price_type(&self) -> &'static str {
        match self {
            TransactionKind::Rental => "MONTHLY_RENTAL_PRICE",
            TransactionKind::Sale => "SALE_PRICE",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rent" | "rental" | "for-rent" => Ok(TransactionKind::Rental),
            "sale" | "for-sale" => Ok(TransactionKind::Sale),
            _ => Err(format!("Unknown transaction kind: {}. Use: rent, sale", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Rental => write!(f, "rental"),
            TransactionKind::Sale => write!(f, "sale"),
        }
    }
}

/// A single real-estate listing.
///
/// Identity is the source URL and nothing else: a listing whose price or
/// address text changes is still the same listing. `PartialEq`/`Hash` must
/// stay URL-only or reconciliation outcomes change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Source URL, the primary identity.
    pub url: String,
    /// Price text as displayed on the page, not guaranteed numeric.
    pub price: Option<String>,
    /// Locality / address text.
    pub locality: Option<String>,
    /// Inferred transaction kind, unset when undeterminable.
    pub transaction: Option<TransactionKind>,
    /// Set by the store when the listing is first persisted.
    pub first_seen: Option<DateTime<Utc>>,
}

impl Listing {
    /// Creates a listing with only its identity; fields are filled by
    /// extraction.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), price: None, locality: None, transaction: None, first_seen: None }
    }

    /// One human-readable line for notification messages.
    pub fn summary_line(&self) -> String {
        let locality = self.locality.as_deref().unwrap_or("unknown location");
        let price = self.price.as_deref().unwrap_or("price n/a");
        match self.transaction {
            Some(kind) => format!("{} - {} ({})\n{}", locality, price, kind, self.url),
            None => format!("{} - {}\n{}", locality, price, self.url),
        }
    }
}

impl PartialEq for Listing {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Listing {}

impl std::hash::Hash for Listing {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// The complete set of listings observed or stored at one point in time.
///
/// Order follows the query's `orderBy` option; no other ordering is implied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub listings: Vec<Listing>,
}

impl Snapshot {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listing> {
        self.listings.iter()
    }

    /// Set of listing URLs, for membership checks during reconciliation.
    pub fn urls(&self) -> HashSet<&str> {
        self.listings.iter().map(|l| l.url.as_str()).collect()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.listings.iter().any(|l| l.url == url)
    }
}

impl FromIterator<Listing> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Listing>>(iter: I) -> Self {
        Self { listings: iter.into_iter().collect() }
    }
}

//! Immoweb-specific modules: HTTP client, query construction, and extraction.

pub mod client;
pub mod detail;
pub mod index;
pub mod models;
pub mod query;
pub mod selectors;

pub use client::{FetchPage, ImmowebClient};
pub use detail::DetailExtractor;
pub use index::IndexFetcher;
pub use models::{Listing, ListingRef, Snapshot, TransactionKind};
pub use query::{FilterSpec, PropertyCategory, QueryBuilder, SortOrder};

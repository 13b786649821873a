//! immowatch - Immoweb listing watcher with Telegram notifications
//!
//! Scrapes Immoweb listings matching a filter, diffs them against the
//! stored snapshot, and announces newcomers.

pub mod commands;
pub mod config;
pub mod error;
pub mod immoweb;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod store;

pub use config::Config;
pub use error::ScrapeError;
pub use immoweb::models::{Listing, ListingRef, Snapshot, TransactionKind};
pub use immoweb::query::{FilterSpec, PropertyCategory, SortOrder};

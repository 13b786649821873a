//! CLI command implementations.

pub mod scrape;
pub mod watch;

pub use scrape::ScrapeCommand;
pub use watch::WatchCommand;

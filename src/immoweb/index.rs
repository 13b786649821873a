//! Search-results harvesting: one query URL in, listing references out.

use crate::error::ScrapeError;
use crate::immoweb::client::FetchPage;
use crate::immoweb::models::ListingRef;
use crate::immoweb::selectors::search;
use scraper::Html;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of parsing one search-results document.
struct IndexPage {
    /// True when the result grid (or an explicit "no results" marker) is
    /// present, i.e. the page has finished populating.
    grid_ready: bool,
    refs: Vec<ListingRef>,
}

/// Fetches the search page for a query URL and extracts listing references.
///
/// The result grid is script-populated on the live site, so the page is
/// re-fetched until the grid marker appears, bounded by `wait_timeout`. A
/// timeout yields an empty list rather than an error: an empty grid may just
/// mean an over-restrictive filter.
pub struct IndexFetcher {
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl IndexFetcher {
    pub fn new(wait_timeout: Duration, poll_interval: Duration) -> Self {
        Self { wait_timeout, poll_interval }
    }

    /// Returns at most `max_results` references, first in document order.
    /// Does not paginate past the first page.
    pub async fn fetch<F: FetchPage>(
        &self,
        fetcher: &F,
        query_url: &str,
        max_results: usize,
    ) -> Result<Vec<ListingRef>, ScrapeError> {
        let origin = origin_of(query_url);
        let started = Instant::now();

        loop {
            // Transport failure here is fatal: without an index page there is
            // nothing to list.
            let html = fetcher.fetch(query_url).await?;
            let page = parse_index(&html, origin);

            if page.grid_ready {
                let mut refs = page.refs;
                refs.truncate(max_results);
                debug!("Index page yielded {} references (cap {})", refs.len(), max_results);
                return Ok(refs);
            }

            if started.elapsed() >= self.wait_timeout {
                warn!(
                    "Result grid did not appear within {:?}; treating as empty result set",
                    self.wait_timeout
                );
                return Ok(Vec::new());
            }

            debug!("Result grid not ready, retrying in {:?}", self.poll_interval);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Scheme plus host of a URL, for resolving relative card links.
fn origin_of(url: &str) -> &str {
    let after_scheme = match url.find("://") {
        Some(idx) => idx + 3,
        None => return url,
    };
    match url[after_scheme..].find('/') {
        Some(idx) => &url[..after_scheme + idx],
        None => url,
    }
}

fn parse_index(html: &str, origin: &str) -> IndexPage {
    let document = Html::parse_document(html);

    let mut refs = Vec::new();
    let mut cards = 0usize;

    for card in document.select(&search::RESULT_CARD) {
        cards += 1;

        // First candidate anchor that carries an href wins.
        let href = search::CARD_LINK
            .iter()
            .filter_map(|sel| card.select(sel).next())
            .find_map(|a| a.value().attr("href"));

        match href {
            Some(href) if !href.is_empty() => {
                let url = if href.starts_with("http") {
                    href.to_string()
                } else {
                    format!("{}{}", origin, href)
                };
                refs.push(ListingRef(url));
            }
            // A malformed card must not abort the batch.
            _ => warn!("Skipping result card without a listing link"),
        }
    }

    let grid_ready = cards > 0 || document.select(&search::NO_RESULTS).next().is_some();

    IndexPage { grid_ready, refs }
}

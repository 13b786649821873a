//! Per-listing detail extraction.

use crate::error::ScrapeError;
use crate::immoweb::client::FetchPage;
use crate::immoweb::models::{Listing, ListingRef, TransactionKind};
use crate::immoweb::selectors::detail;
use scraper::{Html, Selector};
use tracing::{debug, trace};

/// Extracts structured listing fields from detail pages.
///
/// Field lookups are independent: a field that cannot be found is left unset,
/// never an error, because downstream identity depends only on the URL.
pub struct DetailExtractor;

impl DetailExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Loads the reference's page and extracts it. Transport failure is the
    /// only error path; the caller decides whether to skip the reference.
    pub async fn fetch_and_extract<F: FetchPage>(
        &self,
        fetcher: &F,
        reference: &ListingRef,
    ) -> Result<Listing, ScrapeError> {
        let html = fetcher.fetch(reference.url()).await?;
        Ok(self.extract(reference.url(), &html))
    }

    /// Pure parse of one detail page. Always returns a listing; missing
    /// fields are unset.
    pub fn extract(&self, url: &str, html: &str) -> Listing {
        let document = Html::parse_document(html);

        let mut listing = Listing::new(url);
        listing.price = first_text(&document, &detail::PRICE);
        listing.locality = first_text(&document, &detail::LOCALITY);

        // The <h1> is usually the listing headline and carries no transaction
        // marker; the document <title> does. Scan every candidate and take
        // the first one the heuristic recognizes.
        listing.transaction = detail::TITLE
            .iter()
            .filter_map(|sel| document.select(sel).next())
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .find_map(|text| infer_transaction_kind(&text));

        trace!(
            "Extracted {}: price={:?} locality={:?} transaction={:?}",
            url,
            listing.price,
            listing.locality,
            listing.transaction
        );

        listing
    }
}

impl Default for DetailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Tries each candidate selector in order and returns the first non-empty
/// text match.
fn first_text(document: &Html, candidates: &[Selector]) -> Option<String> {
    for selector in candidates {
        if let Some(element) = document.select(selector).next() {
            let text = element.text().collect::<String>();
            let text = normalize_whitespace(&text);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    debug!("No candidate selector matched");
    None
}

/// Collapses runs of whitespace; page text is littered with layout newlines.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Infers the transaction kind from the page title.
///
/// Heuristic: Immoweb titles contain "for sale" or "for rent" in English
/// copy. Site copy changes silently break this, which is why it is isolated
/// here and why `None` is a legal outcome.
pub fn infer_transaction_kind(title: &str) -> Option<TransactionKind> {
    let lower = title.to_lowercase();
    if lower.contains("for sale") {
        Some(TransactionKind::Sale)
    } else if lower.contains("for rent") {
        Some(TransactionKind::Rental)
    } else {
        None
    }
}

//! CSS selectors for Immoweb HTML parsing.
//!
//! All selectors used for parsing live here. Update this file when Immoweb
//! changes their markup.
//!
//! Field selectors are ordered candidate lists tried front to back; the first
//! match wins. Comma-alternatives inside one selector would lose that priority
//! (document order decides instead), so fallbacks get their own entry.

use scraper::Selector;
use std::sync::LazyLock;

fn parse(css: &str) -> Selector {
    Selector::parse(css).expect("selector must be valid CSS")
}

/// Selectors for search-results pages.
pub mod search {
    use super::*;

    /// Listing card container. Its presence marks a populated result grid.
    pub static RESULT_CARD: LazyLock<Selector> =
        LazyLock::new(|| parse("li.search-results__item"));

    /// Anchor carrying the listing detail URL, fallbacks first-match.
    pub static CARD_LINK: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        vec![parse("a.card__title-link"), parse("h2.card__title a"), parse("a.card-link")]
    });

    /// "No results" marker, distinguishes an empty search from a page that
    /// has not rendered its grid.
    pub static NO_RESULTS: LazyLock<Selector> =
        LazyLock::new(|| parse(".search-results__empty, .no-results"));
}

/// Selectors for individual listing detail pages.
pub mod detail {
    use super::*;

    /// Displayed price text.
    pub static PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        vec![
            parse("p.classified__price span.sr-only"),
            parse("p.classified__price"),
            parse("span.card__price"),
        ]
    });

    /// Locality / address block.
    pub static LOCALITY: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        vec![
            parse(".classified__information--address-row"),
            parse(".classified__information--address"),
            parse("span.card__location"),
        ]
    });

    /// Texts scanned for the transaction-kind marker. All candidates are
    /// tried: the heading is often just the listing headline, while the
    /// document `<title>` carries the "for rent"/"for sale" copy.
    pub static TITLE: LazyLock<Vec<Selector>> =
        LazyLock::new(|| vec![parse("h1.classified__title"), parse("title")]);
}

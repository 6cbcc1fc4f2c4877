// src/page.rs
// =============================================================================
// ParsedPage: a fetched page parsed into a queryable DOM.
//
// Two consumers:
// - the crawler itself, harvesting outbound links through the configured
//   selector (links())
// - the caller's page observer, which gets the same querying facility for
//   arbitrary data extraction (select() / texts())
//
// Link candidates are resolved against the page's own URL, so relative
// hrefs come out absolute, and fragments are stripped before comparison:
// a fragment never denotes a distinct fetchable resource.
// =============================================================================

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{Error, Result};

/// A successfully fetched page, parsed and ready for querying.
pub struct ParsedPage {
    document: Html,
    url: Url,
}

impl ParsedPage {
    /// Parses `html` as a full document belonging to `url`. Never fails:
    /// malformed markup simply yields whatever the parser can recover,
    /// and an empty body yields a page with no links.
    pub fn new(html: &str, url: Url) -> Self {
        Self {
            document: Html::parse_document(html),
            url,
        }
    }

    /// The URL this page was fetched from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The underlying parsed document, for callers that want to run their
    /// own scraper queries.
    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Candidate outbound URLs: the `href` of every element matched by
    /// `selector`, resolved to an absolute URL, fragment stripped, batch
    /// deduplicated preserving first-occurrence order. Only http/https
    /// results are kept; mailto:, javascript: and friends are not
    /// fetchable pages.
    pub fn links(&self, selector: &Selector) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in self.document.select(selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(mut resolved) = self.url.join(href) else {
                // Unresolvable href, skip it
                continue;
            };
            resolved.set_fragment(None);

            if !matches!(resolved.scheme(), "http" | "https") {
                continue;
            }
            let url = resolved.to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }

        links
    }

    /// All elements matching `selector`.
    pub fn select(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).collect())
    }

    /// The concatenated text content of every element matching `selector`.
    pub fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .collect())
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| Error::InvalidSelector(selector.to_string()))
}

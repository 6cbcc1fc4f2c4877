// src/link/mod.rs
// =============================================================================
// Links and link collections.
//
// Submodules:
// - set: LinkSet, the FIFO queue/set hybrid the crawler's bookkeeping runs on
//
// This file defines Link itself: a validated (URL, depth) pair. Depth counts
// link-hops from the crawl's base URL, measured at first discovery.
// =============================================================================

mod set;

pub use set::LinkSet;

use url::Url;

use crate::error::{Error, Result};

/// A validated URL together with the depth at which it was discovered.
///
/// Immutable once constructed. The URL is stored in its normalized form
/// (e.g. a host-only URL gains a trailing slash), which is also the identity
/// used by [`LinkSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    url: Url,
    depth: usize,
}

impl Link {
    /// Builds a Link, validating that `url` parses as an absolute URL.
    pub fn new(url: &str, depth: usize) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        Ok(Self { url: parsed, depth })
    }

    // Internal constructor for URLs that were already validated on the way
    // into a LinkSet.
    pub(crate) fn from_parsed(url: Url, depth: usize) -> Self {
        Self { url, depth }
    }

    /// The normalized URL as a string.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// The parsed URL.
    pub fn parsed_url(&self) -> &Url {
        &self.url
    }

    /// Number of link-hops from the base URL at first discovery.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn into_parts(self) -> (Url, usize) {
        (self.url, self.depth)
    }
}

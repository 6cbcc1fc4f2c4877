// src/error.rs
// =============================================================================
// Error kinds for the crawler library.
//
// Validation errors (InvalidUrl, InvalidDepth, InvalidSelector) are raised
// eagerly and are always fatal to the call that triggered them: a rejected
// batch leaves the target LinkSet untouched.
//
// Transport wraps whatever the injected Fetcher raised. The core never
// inspects or retries it; it unwinds out of crawl().
// =============================================================================

use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A string failed URL well-formedness validation.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A depth was negative. Only reachable through the signed import
    /// boundary (`LinkSet::from_entries`); in-process depths are unsigned.
    #[error("invalid depth {depth} for {url}: depth must be non-negative")]
    InvalidDepth { url: String, depth: i64 },

    /// A link selector string is not a parsable CSS selector.
    #[error("invalid link selector: {0:?}")]
    InvalidSelector(String),

    /// The injected Fetcher failed while requesting a page.
    #[error("transport error while fetching {url}")]
    Transport {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

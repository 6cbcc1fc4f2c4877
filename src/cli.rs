// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// The binary is a thin wrapper over the library: it wires up the default
// HTTP fetcher, runs one crawl, and prints what was visited. All traversal
// semantics live in the library.
// =============================================================================

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "sitewalker",
    version,
    about = "Breadth-first website crawler with a configurable depth budget",
    long_about = "sitewalker crawls a website breadth-first from a starting URL, following \
                  links that match a CSS selector and stay within the base URL, down to a \
                  configurable depth. It reports every page visited and every link found \
                  but left unfetched because it was too deep."
)]
pub struct Cli {
    /// URL to start crawling from (e.g. https://example.com)
    pub url: String,

    /// Maximum crawl depth: 0 fetches only the starting page, 1 adds the
    /// pages it links to, and so on
    #[arg(long, default_value_t = 2)]
    pub max_depth: usize,

    /// Disable the depth budget entirely; the crawl is then bounded only by
    /// the set of reachable same-site URLs
    #[arg(long, conflicts_with = "max_depth")]
    pub unbounded: bool,

    /// CSS selector for the links to follow
    #[arg(long, default_value = "a")]
    pub selector: String,

    /// Output the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

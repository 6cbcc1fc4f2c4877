// src/lib.rs
// =============================================================================
// sitewalker: bounded-depth, breadth-first web traversal.
//
// Given a base URL, the crawler fetches pages, harvests outbound links
// matching a CSS selector, and repeats on each newly discovered URL until
// the depth budget runs out. Uniqueness and depth bookkeeping live in
// LinkSet; the visit/enqueue loop lives in Crawler; HTTP transport is an
// injected collaborator behind the Fetcher trait.
//
// Minimal usage:
//
//   let fetcher = HttpFetcher::new()?;
//   let mut crawler = Crawler::new("https://example.com", fetcher)?;
//   crawler.set_page_observer(|page: &ParsedPage| {
//       println!("visited {}", page.url());
//   });
//   crawler.crawl(MaxDepth::Bounded(2)).await?;
//   for url in crawler.visited().all(None) {
//       println!("{}", url);
//   }
// =============================================================================

mod crawler;
mod error;
mod fetch;
mod link;
mod page;

pub use crawler::{AdmissionPolicy, Crawler, MaxDepth, PageObserver, DEFAULT_LINK_SELECTOR};
pub use error::{Error, Result};
pub use fetch::{Fetcher, HttpFetcher, PageResponse};
pub use link::{Link, LinkSet};
pub use page::ParsedPage;

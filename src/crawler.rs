// src/crawler.rs
// =============================================================================
// The traversal orchestrator.
//
// The crawler owns three LinkSets for the lifetime of one crawl:
// - queued:   discovered, waiting to be fetched
// - visited:  fetched with a 200 response
// - too_deep: discovered, never fetched because the depth budget was exceeded
//
// Per discovered URL the states are Unvisited -> Queued -> {Visited, TooDeep},
// with Visited terminal and TooDeep terminal unless re-admission through a
// new discovery path is enabled (the default). The three sets stay mutually
// exclusive by URL at all times.
//
// One loop iteration: dequeue, depth-check, fetch, record, observe, extract,
// admit, dedup, enqueue at depth + 1. One fetch is in flight at a time, so
// the sets never see concurrent mutation.
// =============================================================================

use scraper::Selector;
use url::Url;

use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::link::LinkSet;
use crate::page::{parse_selector, ParsedPage};

/// Selector used to harvest candidate links when none is configured:
/// every hyperlink-bearing element.
pub const DEFAULT_LINK_SELECTOR: &str = "a";

/// Depth budget for a crawl.
///
/// `Bounded(0)` fetches only the base URL; everything discovered from it is
/// filed too-deep. In `Unbounded` mode the depth cutoff is disabled and
/// termination relies solely on the admission policy and URL dedup keeping
/// the reachable URL space finite — admitting an infinite URL space will
/// not terminate, which is the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxDepth {
    Bounded(usize),
    Unbounded,
}

impl MaxDepth {
    /// Fetch the base URL and nothing deeper.
    pub const ONLY_TARGET: MaxDepth = MaxDepth::Bounded(0);
    /// The default budget of two hops.
    pub const DEFAULT: MaxDepth = MaxDepth::Bounded(2);
}

impl Default for MaxDepth {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<usize> for MaxDepth {
    fn from(max_depth: usize) -> Self {
        Self::Bounded(max_depth)
    }
}

/// Decides whether a discovered URL is eligible to be queued.
///
/// The default (used when no policy is set) admits URLs starting with the
/// crawl's normalized base URL, restricting the crawl to the base subtree.
/// Implemented for any `Fn(&str) -> bool` closure.
pub trait AdmissionPolicy {
    fn admit(&self, url: &str) -> bool;
}

impl<F> AdmissionPolicy for F
where
    F: Fn(&str) -> bool,
{
    fn admit(&self, url: &str) -> bool {
        self(url)
    }
}

/// Invoked once per successfully fetched page, before link extraction, for
/// caller-defined data extraction. Implemented for any `FnMut(&ParsedPage)`
/// closure.
pub trait PageObserver {
    fn page_visited(&mut self, page: &ParsedPage);
}

impl<F> PageObserver for F
where
    F: FnMut(&ParsedPage),
{
    fn page_visited(&mut self, page: &ParsedPage) {
        self(page)
    }
}

/// Bounded-depth breadth-first web traversal over an injected [`Fetcher`].
pub struct Crawler<F: Fetcher> {
    base_url: Url,
    fetcher: F,
    selector: Selector,
    selector_source: String,
    admission: Option<Box<dyn AdmissionPolicy>>,
    observer: Option<Box<dyn PageObserver>>,
    too_deep_blocks_requeue: bool,
    queued: LinkSet,
    visited: LinkSet,
    too_deep: LinkSet,
}

impl<F: Fetcher> std::fmt::Debug for Crawler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("base_url", &self.base_url)
            .field("selector_source", &self.selector_source)
            .field("too_deep_blocks_requeue", &self.too_deep_blocks_requeue)
            .field("queued", &self.queued)
            .field("visited", &self.visited)
            .field("too_deep", &self.too_deep)
            .finish_non_exhaustive()
    }
}

impl<F: Fetcher> Crawler<F> {
    /// Builds a crawler for `base_url` over the given fetch collaborator.
    /// Fails with [`Error::InvalidUrl`] if the base URL is malformed. No
    /// network activity happens until [`Crawler::crawl`].
    pub fn new(base_url: &str, fetcher: F) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|_| Error::InvalidUrl(base_url.to_string()))?;
        Ok(Self {
            base_url,
            fetcher,
            selector: parse_selector(DEFAULT_LINK_SELECTOR)?,
            selector_source: DEFAULT_LINK_SELECTOR.to_string(),
            admission: None,
            observer: None,
            too_deep_blocks_requeue: false,
            queued: LinkSet::new(),
            visited: LinkSet::new(),
            too_deep: LinkSet::new(),
        })
    }

    /// The CSS selector links are harvested with.
    pub fn link_selector(&self) -> &str {
        &self.selector_source
    }

    /// Sets the CSS selector used to harvest candidate links from fetched
    /// pages. Validated eagerly; an unparsable selector fails with
    /// [`Error::InvalidSelector`].
    pub fn set_link_selector(&mut self, selector: &str) -> Result<&mut Self> {
        self.selector = parse_selector(selector)?;
        self.selector_source = selector.to_string();
        Ok(self)
    }

    /// Replaces the default within-base-URL admission check.
    pub fn set_admission_policy(&mut self, policy: impl AdmissionPolicy + 'static) -> &mut Self {
        self.admission = Some(Box::new(policy));
        self
    }

    /// Installs the per-page observer.
    pub fn set_page_observer(&mut self, observer: impl PageObserver + 'static) -> &mut Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Seeds the queue, e.g. to resume a crawl from exported state. A base
    /// URL already present keeps its seeded depth when the crawl starts.
    pub fn set_queued(&mut self, queued: LinkSet) -> &mut Self {
        self.queued = queued;
        self
    }

    /// Seeds the visited set; seeded URLs are never fetched or re-queued.
    pub fn set_visited(&mut self, visited: LinkSet) -> &mut Self {
        self.visited = visited;
        self
    }

    /// Whether a URL already filed as too-deep is barred from re-queuing
    /// when rediscovered through another path. Off by default: a rediscovery
    /// may arrive through a shallower path and deserves reconsideration, in
    /// which case the URL leaves the too-deep set again.
    pub fn set_too_deep_blocks_requeue(&mut self, blocks: bool) -> &mut Self {
        self.too_deep_blocks_requeue = blocks;
        self
    }

    pub fn queued(&self) -> &LinkSet {
        &self.queued
    }

    pub fn visited(&self) -> &LinkSet {
        &self.visited
    }

    pub fn too_deep(&self) -> &LinkSet {
        &self.too_deep
    }

    /// Runs the traversal to completion, returning when the queue is empty.
    ///
    /// Transport errors from the fetcher are not caught here: they surface
    /// as [`Error::Transport`] and terminate the crawl, leaving retry policy
    /// entirely to the injected collaborator. Non-200 responses are not
    /// errors; the page is silently dropped and its links never examined.
    pub async fn crawl(&mut self, max_depth: MaxDepth) -> Result<()> {
        // append_many leaves an already-seeded base URL at its seeded depth
        self.queued.append_many([self.base_url.as_str()], 0)?;
        tracing::info!(base = %self.base_url, ?max_depth, "starting crawl");

        while let Some(link) = self.queued.shift() {
            if let MaxDepth::Bounded(budget) = max_depth {
                if link.depth() > budget {
                    tracing::debug!(url = link.url(), depth = link.depth(), "over depth budget");
                    self.too_deep.push(link);
                    continue;
                }
            }

            let response =
                self.fetcher
                    .request(link.url())
                    .await
                    .map_err(|source| Error::Transport {
                        url: link.url().to_string(),
                        source,
                    })?;

            if !response.is_success() {
                tracing::debug!(url = link.url(), status = response.status, "skipping page");
                continue;
            }

            let depth = link.depth();
            let page = ParsedPage::new(&response.body, link.parsed_url().clone());
            self.visited.push(link);
            tracing::debug!(url = %page.url(), depth, "visited page");

            if let Some(observer) = self.observer.as_mut() {
                observer.page_visited(&page);
            }

            let survivors = self.admit_candidates(page.links(&self.selector));
            self.queued.append_many(survivors, depth + 1)?;
        }

        tracing::info!(
            visited = self.visited.count(),
            too_deep = self.too_deep.count(),
            "crawl finished"
        );
        Ok(())
    }

    // Admission policy, then dedup against the sets. Candidates arrive
    // already fragment-stripped and batch-deduplicated.
    fn admit_candidates(&mut self, candidates: Vec<String>) -> Vec<String> {
        let mut survivors = Vec::new();
        for url in candidates {
            if !self.admitted(&url) {
                continue;
            }
            if self.queued.contains(&url) || self.visited.contains(&url) {
                continue;
            }
            if self.too_deep.contains(&url) {
                if self.too_deep_blocks_requeue {
                    continue;
                }
                // Reconsidered through a new path; keep the sets exclusive
                self.too_deep.remove(&url);
            }
            survivors.push(url);
        }
        survivors
    }

    fn admitted(&self, url: &str) -> bool {
        match &self.admission {
            Some(policy) => policy.admit(url),
            None => url.starts_with(self.base_url.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PageResponse;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    const BASE: &str = "https://example.com/";

    // Serves canned (status, body) pairs; unknown URLs get a 404.
    struct MockFetcher {
        pages: HashMap<String, (u16, String)>,
    }

    impl MockFetcher {
        fn new(pages: &[(&str, u16, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, status, body)| (url.to_string(), (*status, body.to_string())))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn request(&self, url: &str) -> anyhow::Result<PageResponse> {
            Ok(match self.pages.get(url) {
                Some((status, body)) => PageResponse {
                    status: *status,
                    body: body.clone(),
                },
                None => PageResponse {
                    status: 404,
                    body: String::new(),
                },
            })
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        async fn request(&self, _url: &str) -> anyhow::Result<PageResponse> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn assert_sets_disjoint<F: Fetcher>(crawler: &Crawler<F>) {
        for url in crawler.visited().all(None) {
            assert!(!crawler.queued().contains(&url), "{} in visited and queued", url);
            assert!(!crawler.too_deep().contains(&url), "{} in visited and too_deep", url);
        }
        for url in crawler.queued().all(None) {
            assert!(!crawler.too_deep().contains(&url), "{} in queued and too_deep", url);
        }
    }

    #[tokio::test]
    async fn test_crawl_with_base_only_admission() {
        let fetcher = MockFetcher::new(&[(
            BASE,
            200,
            r#"<html><body><a href="https://example.com/page1">Page 1</a></body></html>"#,
        )]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();
        crawler.set_admission_policy(|url: &str| url == BASE);

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert_eq!(crawler.visited().all(None), vec![BASE]);
        assert!(crawler.queued().is_empty());
        assert!(crawler.too_deep().is_empty());
    }

    #[tokio::test]
    async fn test_crawl_follows_same_prefix_links() {
        let fetcher = MockFetcher::new(&[
            (
                BASE,
                200,
                r#"<a href="https://example.com/page1">Page 1</a>"#,
            ),
            ("https://example.com/page1", 200, "<html><body>end</body></html>"),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert_eq!(
            crawler.visited().all(None),
            vec![BASE, "https://example.com/page1"]
        );
        assert!(crawler.queued().is_empty());
        assert!(crawler.too_deep().is_empty());
        assert_eq!(crawler.visited().depth_of("https://example.com/page1"), Some(1));
    }

    #[tokio::test]
    async fn test_prequeued_link_over_budget_goes_too_deep() {
        let mut crawler = Crawler::new(BASE, MockFetcher::new(&[])).unwrap();
        crawler.set_queued(LinkSet::from_entries([(BASE.to_string(), 2)]).unwrap());

        crawler.crawl(MaxDepth::Bounded(1)).await.unwrap();

        assert_eq!(crawler.too_deep().all(None), vec![BASE]);
        assert_eq!(crawler.too_deep().depth_of(BASE), Some(2));
        assert!(crawler.visited().is_empty());
        assert!(crawler.queued().is_empty());
    }

    #[tokio::test]
    async fn test_non_200_base_is_dropped_silently() {
        let fetcher = MockFetcher::new(&[(BASE, 404, "not found")]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert!(crawler.visited().is_empty());
        assert!(crawler.queued().is_empty());
        assert!(crawler.too_deep().is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_links_filtered_by_default_policy() {
        let fetcher = MockFetcher::new(&[
            (
                BASE,
                200,
                r#"
                    <a href="/page1">same origin</a>
                    <a href="https://another.com">cross origin</a>
                "#,
            ),
            ("https://example.com/page1", 200, ""),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert_eq!(
            crawler.visited().all(None),
            vec![BASE, "https://example.com/page1"]
        );
        assert!(!crawler.visited().contains("https://another.com/"));
        assert!(!crawler.queued().contains("https://another.com/"));
        assert!(!crawler.too_deep().contains("https://another.com/"));
    }

    #[tokio::test]
    async fn test_depth_partition_on_bounded_crawl() {
        let fetcher = MockFetcher::new(&[
            (BASE, 200, r#"<a href="/a">a</a>"#),
            ("https://example.com/a", 200, r#"<a href="/b">b</a>"#),
            ("https://example.com/b", 200, r#"<a href="/c">c</a>"#),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();

        crawler.crawl(MaxDepth::Bounded(1)).await.unwrap();

        // Everything visited is within budget, everything too-deep is over it
        for url in crawler.visited().all(None) {
            assert!(crawler.visited().depth_of(&url).unwrap() <= 1);
        }
        for url in crawler.too_deep().all(None) {
            assert!(crawler.too_deep().depth_of(&url).unwrap() > 1);
        }
        assert_eq!(
            crawler.visited().all(None),
            vec![BASE, "https://example.com/a"]
        );
        assert_eq!(crawler.too_deep().all(None), vec!["https://example.com/b"]);
        // /c was never discovered because /b was never fetched
        assert!(!crawler.queued().contains("https://example.com/c"));
        assert_sets_disjoint(&crawler);
    }

    #[tokio::test]
    async fn test_fragments_collapse_before_queuing() {
        let fetcher = MockFetcher::new(&[
            (
                "http://x/",
                200,
                r##"<a href="http://x/p#a">A</a><a href="http://x/p#b">B</a>"##,
            ),
            ("http://x/p", 200, ""),
        ]);
        let mut crawler = Crawler::new("http://x/", fetcher).unwrap();

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert_eq!(crawler.visited().all(None), vec!["http://x/", "http://x/p"]);
    }

    #[tokio::test]
    async fn test_unbounded_crawl_terminates_on_cycle() {
        let fetcher = MockFetcher::new(&[
            (BASE, 200, r#"<a href="/page1">there</a>"#),
            (
                "https://example.com/page1",
                200,
                r#"<a href="https://example.com/">back</a>"#,
            ),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();

        crawler.crawl(MaxDepth::Unbounded).await.unwrap();

        // The cycle collapses through the visited-set dedup
        assert_eq!(
            crawler.visited().all(None),
            vec![BASE, "https://example.com/page1"]
        );
        assert!(crawler.queued().is_empty());
        assert!(crawler.too_deep().is_empty());
    }

    #[tokio::test]
    async fn test_visited_url_is_not_requeued() {
        // Both pages link to the base URL again
        let fetcher = MockFetcher::new(&[
            (BASE, 200, r#"<a href="/">self</a><a href="/p">p</a>"#),
            (
                "https://example.com/p",
                200,
                r#"<a href="https://example.com/">home</a>"#,
            ),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert_eq!(crawler.visited().count(), 2);
        assert_eq!(crawler.visited().depth_of(BASE), Some(0));
        assert!(crawler.queued().is_empty());
    }

    #[tokio::test]
    async fn test_too_deep_rediscovery_is_reconsidered_by_default() {
        // /x is seeded at depth 5 and filed too-deep, then rediscovered at
        // depth 1 through the base page.
        let fetcher = MockFetcher::new(&[
            (BASE, 200, r#"<a href="/x">x</a>"#),
            ("https://example.com/x", 200, ""),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();
        crawler.set_queued(
            LinkSet::from_entries([
                ("https://example.com/x".to_string(), 5),
                (BASE.to_string(), 0),
            ])
            .unwrap(),
        );

        crawler.crawl(MaxDepth::Bounded(2)).await.unwrap();

        assert!(crawler.visited().contains("https://example.com/x"));
        assert_eq!(crawler.visited().depth_of("https://example.com/x"), Some(1));
        assert!(crawler.too_deep().is_empty());
        assert_sets_disjoint(&crawler);
    }

    #[tokio::test]
    async fn test_too_deep_blocks_requeue_when_enabled() {
        let fetcher = MockFetcher::new(&[
            (BASE, 200, r#"<a href="/x">x</a>"#),
            ("https://example.com/x", 200, ""),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();
        crawler.set_too_deep_blocks_requeue(true);
        crawler.set_queued(
            LinkSet::from_entries([
                ("https://example.com/x".to_string(), 5),
                (BASE.to_string(), 0),
            ])
            .unwrap(),
        );

        crawler.crawl(MaxDepth::Bounded(2)).await.unwrap();

        assert!(!crawler.visited().contains("https://example.com/x"));
        assert_eq!(crawler.too_deep().all(None), vec!["https://example.com/x"]);
        assert_sets_disjoint(&crawler);
    }

    #[tokio::test]
    async fn test_seeded_visited_blocks_refetch() {
        let fetcher = MockFetcher::new(&[(BASE, 200, r#"<a href="/done">done</a>"#)]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();
        crawler.set_visited(
            LinkSet::from_entries([("https://example.com/done".to_string(), 1)]).unwrap(),
        );

        crawler.crawl(MaxDepth::default()).await.unwrap();

        // /done stays at its previously recorded depth, never re-queued
        assert_eq!(crawler.visited().depth_of("https://example.com/done"), Some(1));
        assert!(crawler.queued().is_empty());
    }

    #[tokio::test]
    async fn test_page_observer_sees_each_visited_page() {
        let fetcher = MockFetcher::new(&[
            (
                BASE,
                200,
                r#"<html><head><title>Home</title></head><body><a href="/p">p</a></body></html>"#,
            ),
            (
                "https://example.com/p",
                200,
                "<html><head><title>P</title></head><body></body></html>",
            ),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();

        let titles = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&titles);
        crawler.set_page_observer(move |page: &ParsedPage| {
            let title = page.texts("title").unwrap().pop().unwrap_or_default();
            sink.borrow_mut().push((page.url().to_string(), title));
        });

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert_eq!(
            *titles.borrow(),
            vec![
                (BASE.to_string(), "Home".to_string()),
                ("https://example.com/p".to_string(), "P".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_link_selector_limits_harvest() {
        let fetcher = MockFetcher::new(&[
            (
                BASE,
                200,
                r#"
                    <a class="follow" href="/yes">yes</a>
                    <a href="/no">no</a>
                "#,
            ),
            ("https://example.com/yes", 200, ""),
        ]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();
        crawler.set_link_selector("a.follow").unwrap();

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert!(crawler.visited().contains("https://example.com/yes"));
        assert!(!crawler.visited().contains("https://example.com/no"));
        assert!(!crawler.too_deep().contains("https://example.com/no"));
    }

    #[tokio::test]
    async fn test_transport_error_terminates_crawl() {
        let mut crawler = Crawler::new(BASE, FailingFetcher).unwrap();

        let err = crawler.crawl(MaxDepth::default()).await.unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert!(crawler.visited().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_empty_extraction() {
        let fetcher = MockFetcher::new(&[(BASE, 200, "<<<%% not html &&& <a href=")]);
        let mut crawler = Crawler::new(BASE, fetcher).unwrap();

        crawler.crawl(MaxDepth::default()).await.unwrap();

        assert_eq!(crawler.visited().all(None), vec![BASE]);
        assert!(crawler.queued().is_empty());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = Crawler::new("not a url", MockFetcher::new(&[])).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_link_selector_accessors() {
        let mut crawler = Crawler::new(BASE, MockFetcher::new(&[])).unwrap();
        assert_eq!(crawler.link_selector(), "a");

        crawler.set_link_selector("a.test-link").unwrap();
        assert_eq!(crawler.link_selector(), "a.test-link");

        let err = crawler.set_link_selector("a[").unwrap_err();
        assert!(matches!(err, Error::InvalidSelector(_)));
        // A rejected selector leaves the previous one in place
        assert_eq!(crawler.link_selector(), "a.test-link");
    }

    #[test]
    fn test_max_depth_conversions() {
        assert_eq!(MaxDepth::default(), MaxDepth::Bounded(2));
        assert_eq!(MaxDepth::from(0), MaxDepth::ONLY_TARGET);
        assert_ne!(MaxDepth::Unbounded, MaxDepth::Bounded(usize::MAX));
    }
}

// src/link/set.rs
// =============================================================================
// LinkSet: an insertion-ordered mapping from URL to discovery depth.
//
// The crawler keeps three of these per crawl (queued, visited, too-deep).
// Two structures back one set:
// - VecDeque<Url>: insertion order, so shift() dequeues strictly FIFO
// - HashMap<String, usize>: O(1) membership checks and depth lookups
//
// Entries only ever leave through shift(), so the two stay in sync.
//
// Dequeue order is strict first-in-first-out. Prepending newly discovered
// URLs ahead of existing queue contents would bias the traversal towards
// last-batch-first while the depth bookkeeping still assumes breadth-first;
// new entries always go to the back.
// =============================================================================

use std::collections::{HashMap, VecDeque};

use url::Url;

use crate::error::{Error, Result};
use crate::link::Link;

/// Ordered URL -> depth mapping with set semantics (URLs are unique keys).
#[derive(Debug, Default, Clone)]
pub struct LinkSet {
    order: VecDeque<Url>,
    depths: HashMap<String, usize>,
}

impl LinkSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from exported (url, depth) entries, validating every URL
    /// and every depth exactly as construction does. The whole batch is
    /// rejected on the first violation.
    ///
    /// Depths arrive signed because exported state may come from outside the
    /// process (a JSON file, for instance); negative values fail with
    /// [`Error::InvalidDepth`].
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        let mut set = Self::new();
        for (url, depth) in entries {
            let parsed = Url::parse(&url).map_err(|_| Error::InvalidUrl(url.clone()))?;
            let depth = usize::try_from(depth).map_err(|_| Error::InvalidDepth { url, depth })?;
            set.insert(parsed, depth);
        }
        Ok(set)
    }

    /// Inserts a pre-validated link, overwriting the recorded depth if the
    /// URL is already present. Overwriting keeps the original queue position.
    pub fn push(&mut self, link: Link) {
        let (url, depth) = link.into_parts();
        self.insert(url, depth);
    }

    fn insert(&mut self, url: Url, depth: usize) {
        let key = url.as_str().to_string();
        if self.depths.insert(key, depth).is_none() {
            self.order.push_back(url);
        }
    }

    /// Inserts every URL not already present, at `depth`. URLs that are
    /// already keys keep their previously recorded depth: depth reflects
    /// shortest discovery distance, so a later, deeper rediscovery must not
    /// overwrite it.
    ///
    /// The whole batch is validated before anything is inserted; an invalid
    /// URL fails the call with no partial insert. Returns how many entries
    /// were actually added.
    pub fn append_many<I, S>(&mut self, urls: I, depth: usize) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for url in urls {
            let url = url.as_ref();
            parsed.push(Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?);
        }

        let mut added = 0;
        for url in parsed {
            if !self.depths.contains_key(url.as_str()) {
                self.insert(url, depth);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Removes and returns the earliest-inserted entry, or None if empty.
    pub fn shift(&mut self) -> Option<Link> {
        let url = self.order.pop_front()?;
        let depth = self.depths.remove(url.as_str())?;
        Some(Link::from_parsed(url, depth))
    }

    /// All URLs in insertion order, optionally restricted to one depth.
    pub fn all(&self, depth_filter: Option<usize>) -> Vec<String> {
        self.order
            .iter()
            .filter(|url| match depth_filter {
                Some(depth) => self.depths.get(url.as_str()) == Some(&depth),
                None => true,
            })
            .map(|url| url.as_str().to_string())
            .collect()
    }

    /// Removes `url` if present, returning its recorded depth. Used when a
    /// too-deep URL is re-admitted to the queue through a new discovery path.
    pub fn remove(&mut self, url: &str) -> Option<usize> {
        let depth = self.depths.remove(url)?;
        self.order.retain(|candidate| candidate.as_str() != url);
        Some(depth)
    }

    /// Whether `url` (in normalized form) is a key of this set.
    pub fn contains(&self, url: &str) -> bool {
        self.depths.contains_key(url)
    }

    /// The recorded depth for `url`, if present.
    pub fn depth_of(&self, url: &str) -> Option<usize> {
        self.depths.get(url).copied()
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Exports the set as plain (url, depth) entries in insertion order,
    /// suitable for persistence or inspection. [`LinkSet::from_entries`]
    /// round-trips this.
    pub fn to_entries(&self) -> Vec<(String, usize)> {
        self.order
            .iter()
            .map(|url| {
                let key = url.as_str();
                (key.to_string(), self.depths[key])
            })
            .collect()
    }
}

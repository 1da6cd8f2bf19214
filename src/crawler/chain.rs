//! Redirect chain data model
//!
//! A `RedirectChain` is the ordered list of `HopRecord`s produced while
//! following one URL, and a `CrawlResult` ties a chain to the sitemap entry
//! that produced it.

use crate::crawler::metadata::PageMetadata;
use crate::scoring::{detect_issues, score_chain, Issue, ScoreBreakdown};
use crate::sitemap::SitemapEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Presence of the three Open Graph tags that drive link previews
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OgFlags {
    pub has_image: bool,
    pub has_title: bool,
    pub has_description: bool,
}

impl OgFlags {
    /// Number of tags present
    pub fn count(&self) -> usize {
        [self.has_image, self.has_title, self.has_description]
            .iter()
            .filter(|present| **present)
            .count()
    }

    /// Names of the tags that are missing, in `image, title, description` order
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.has_image {
            missing.push("og:image");
        }
        if !self.has_title {
            missing.push("og:title");
        }
        if !self.has_description {
            missing.push("og:description");
        }
        missing
    }
}

/// One fetch attempt's outcome within a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HopRecord {
    /// The URL fetched
    pub url: String,

    /// HTTP status code; `None` when no response was received
    pub status_code: Option<u16>,

    /// Milliseconds from the start of the chain to the end of this hop
    pub response_time_ms: u64,

    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub is_https: bool,

    pub page_title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub canonical_url: Option<String>,
    pub og_flags: OgFlags,
    pub hreflang_count: u32,

    /// Set when the hop failed after exhausting its retries
    pub error: Option<String>,
}

impl HopRecord {
    /// Builds a record for a received HTTP response
    ///
    /// `metadata` is only present for HTML responses.
    pub fn response(
        url: &str,
        status_code: u16,
        response_time_ms: u64,
        content_type: Option<String>,
        content_length: Option<u64>,
        metadata: Option<PageMetadata>,
    ) -> Self {
        let metadata = metadata.unwrap_or_default();
        Self {
            url: url.to_string(),
            status_code: Some(status_code),
            response_time_ms,
            content_type,
            content_length,
            is_https: crate::url::is_https(url),
            page_title: metadata.title,
            meta_description: metadata.meta_description,
            h1: metadata.h1,
            canonical_url: metadata.canonical_url,
            og_flags: metadata.og,
            hreflang_count: metadata.hreflang_count,
            error: None,
        }
    }

    /// Builds a terminal record for a hop that never produced a response
    pub fn failure(url: &str, response_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status_code: None,
            response_time_ms,
            content_type: None,
            content_length: None,
            is_https: crate::url::is_https(url),
            page_title: None,
            meta_description: None,
            h1: None,
            canonical_url: None,
            og_flags: OgFlags::default(),
            hreflang_count: 0,
            error: Some(error.into()),
        }
    }

    /// Returns true if the status code is in the redirect range [300, 400)
    pub fn is_redirect(&self) -> bool {
        matches!(self.status_code, Some(300..=399))
    }

    /// Returns true if this hop failed without a usable response
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Ordered hops from the initial URL to its final response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectChain {
    hops: Vec<HopRecord>,
}

impl RedirectChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hop; hops are never modified once appended
    pub(crate) fn push(&mut self, hop: HopRecord) {
        self.hops.push(hop);
    }

    pub fn hops(&self) -> &[HopRecord] {
        &self.hops
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// The last hop, basis for scoring and issue detection
    pub fn final_hop(&self) -> Option<&HopRecord> {
        self.hops.last()
    }

    /// Number of redirects followed
    pub fn redirect_count(&self) -> usize {
        self.hops.len().saturating_sub(1)
    }

    /// Returns true if any URL appears more than once in the chain
    pub fn has_loop(&self) -> bool {
        let mut seen = HashSet::new();
        self.hops.iter().any(|hop| !seen.insert(hop.url.as_str()))
    }

    /// Score of the final hop
    pub fn score(&self) -> ScoreBreakdown {
        score_chain(self)
    }

    /// Issues detected on the chain and its final hop
    pub fn issues(&self) -> Vec<Issue> {
        detect_issues(self)
    }
}

impl From<Vec<HopRecord>> for RedirectChain {
    fn from(hops: Vec<HopRecord>) -> Self {
        Self { hops }
    }
}

/// Outcome of crawling one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub original_url: String,
    pub last_modified: Option<String>,
    pub priority: Option<f64>,
    pub chain: RedirectChain,
}

impl CrawlResult {
    /// Result for a sitemap entry, carrying its metadata
    pub fn from_entry(entry: &SitemapEntry, chain: RedirectChain) -> Self {
        Self {
            original_url: entry.loc.clone(),
            last_modified: entry.last_modified.clone(),
            priority: entry.priority,
            chain,
        }
    }

    /// Result for a URL crawled outside any sitemap
    pub fn single(url: &str, chain: RedirectChain) -> Self {
        Self {
            original_url: url.to_string(),
            last_modified: None,
            priority: None,
            chain,
        }
    }

    /// Synthetic one-hop result for an entry whose resolution itself failed
    pub fn failed(entry: &SitemapEntry, message: impl Into<String>) -> Self {
        let hop = HopRecord::failure(&entry.loc, 0, message);
        Self::from_entry(entry, RedirectChain::from(vec![hop]))
    }
}

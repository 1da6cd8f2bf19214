//! Sitemap discovery
//!
//! Turns a site identifier into the list of page URLs its sitemap declares:
//! - Normalizes the input into a primary sitemap URL
//! - Tries fallback sitemap locations when the primary yields nothing
//! - Parses XML and plain-text sitemaps
//! - Recursively expands sitemap indices, in document order

mod error;
mod parser;

pub use error::{SitemapAttempt, SitemapError, SitemapFailure};
pub use parser::{
    decode_body, detect_format, is_gzip, looks_like_xml, parse_sitemap, ParsedSitemap, SitemapFormat,
};

use crate::config::{Config, SitemapConfig};
use crate::crawler::{build_sitemap_client, FetchError};
use crate::url::{normalize_site_input, sitemap_candidates};
use crate::CrawlerError;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// One page declared by a sitemap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    /// Page URL
    pub loc: String,
    /// `<lastmod>` as written in the sitemap, not parsed further
    pub last_modified: Option<String>,
    /// `<priority>`, typically 0.0 to 1.0, not validated
    pub priority: Option<f64>,
}

impl SitemapEntry {
    /// Entry with no sitemap metadata
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            last_modified: None,
            priority: None,
        }
    }
}

type ExpandFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SitemapFailure>> + Send + 'a>>;

/// Resolves a site into its sitemap entries
#[derive(Debug, Clone)]
pub struct SitemapResolver {
    client: Client,
    timeout: Duration,
    max_depth: u32,
    fallback_paths: Vec<String>,
}

impl SitemapResolver {
    /// Creates a resolver from an existing client
    pub fn new(client: Client, timeout: Duration, config: &SitemapConfig) -> Self {
        Self {
            client,
            timeout,
            max_depth: config.max_depth,
            fallback_paths: config.fallback_paths.clone(),
        }
    }

    /// Creates a resolver with its own redirect-following client
    pub fn from_config(config: &Config) -> Result<Self, CrawlerError> {
        let client = build_sitemap_client(&config.user_agent)?;
        Ok(Self::new(
            client,
            Duration::from_millis(config.crawler.timeout_ms),
            &config.sitemap,
        ))
    }

    /// Resolves a site identifier into its sitemap entries
    ///
    /// Candidates are tried in order and the first one yielding at least one
    /// entry wins. A failing candidate is recorded and the next one is tried.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SitemapEntry>)` - Entries of the first productive candidate
    /// * `Err(SitemapError)` - The input was malformed or every candidate failed
    pub async fn resolve(&self, site: &str) -> Result<Vec<SitemapEntry>, SitemapError> {
        let primary = normalize_site_input(site)?;
        let mut attempts = Vec::new();

        for candidate in sitemap_candidates(&primary, &self.fallback_paths) {
            tracing::info!("Trying sitemap {}", candidate);

            let mut entries = Vec::new();
            let failure = match self.expand(&candidate, 0, &mut entries).await {
                Ok(()) if !entries.is_empty() => {
                    tracing::info!("Found {} URLs in {}", entries.len(), candidate);
                    return Ok(entries);
                }
                Ok(()) => SitemapFailure::Empty,
                Err(failure) => failure,
            };

            tracing::warn!("Sitemap candidate {} failed: {}", candidate, failure);
            attempts.push(SitemapAttempt {
                url: candidate.to_string(),
                failure,
            });
        }

        Err(SitemapError::NotFound { attempts })
    }

    /// Fetches and parses one sitemap, appending its entries to `acc`
    ///
    /// Sitemap indices are expanded recursively up to `max_depth` levels. A
    /// child sitemap that fails is logged and skipped.
    fn expand<'a>(&'a self, url: &'a Url, depth: u32, acc: &'a mut Vec<SitemapEntry>) -> ExpandFuture<'a> {
        Box::pin(async move {
            let (content_type, body) = self.fetch(url).await?;
            let parsed = parse_sitemap(content_type.as_deref(), &body).map_err(SitemapFailure::Parse)?;

            match parsed {
                ParsedSitemap::UrlSet(entries) => {
                    tracing::debug!("{}: {} URLs", url, entries.len());
                    acc.extend(entries);
                }
                ParsedSitemap::Index(children) => {
                    if depth >= self.max_depth {
                        tracing::warn!(
                            "Sitemap index {} exceeds max depth {}; skipping {} children",
                            url,
                            self.max_depth,
                            children.len()
                        );
                        return Ok(());
                    }

                    tracing::debug!("{}: sitemap index with {} children", url, children.len());
                    for child in children {
                        let child_url = match url.join(child.trim()) {
                            Ok(u) => u,
                            Err(e) => {
                                tracing::warn!("Skipping invalid sub-sitemap URL {}: {}", child, e);
                                continue;
                            }
                        };

                        if let Err(failure) = self.expand(&child_url, depth + 1, acc).await {
                            tracing::warn!("Skipping sub-sitemap {}: {}", child_url, failure);
                        }
                    }
                }
                ParsedSitemap::Unrecognized => {
                    tracing::debug!("{}: no urlset or sitemapindex root", url);
                }
            }

            Ok(())
        })
    }

    /// Fetches a sitemap document, returning its Content-Type and body
    ///
    /// Gzip bodies are inflated and returned without a Content-Type.
    async fn fetch(&self, url: &Url) -> Result<(Option<String>, String), SitemapFailure> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SitemapFailure::from(FetchError::from(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SitemapFailure::from_status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SitemapFailure::from(FetchError::from(e)))?;

        // An inflated body is sniffed, its gzip Content-Type no longer applies
        let (body, inflated) = decode_body(&bytes).map_err(SitemapFailure::Parse)?;
        if inflated {
            tracing::debug!("{}: inflated {} gzip bytes", url, bytes.len());
            return Ok((None, body));
        }

        Ok((content_type, body))
    }
}

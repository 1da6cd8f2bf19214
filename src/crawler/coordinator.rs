//! Crawler coordinator - crawl orchestration
//!
//! This module ties the pieces of a crawl together:
//! - Resolving a site's sitemap into entries
//! - Resolving every entry's redirect chain with bounded concurrency
//! - Isolating per-entry failures into synthetic error results
//! - Single-URL resolution and two-site comparison

use crate::config::Config;
use crate::crawler::chain::{CrawlResult, RedirectChain};
use crate::crawler::resolver::ChainResolver;
use crate::crawler::scheduler::Scheduler;
use crate::output::{ComparisonReport, CrawlReport, SiteComparison};
use crate::sitemap::{SitemapEntry, SitemapResolver};
use crate::url::ensure_scheme;
use crate::CrawlerError;
use std::time::Instant;

/// Results between progress log lines
const PROGRESS_INTERVAL: usize = 10;

/// Main crawl coordinator
#[derive(Debug, Clone)]
pub struct Coordinator {
    resolver: ChainResolver,
    sitemaps: SitemapResolver,
    scheduler: Scheduler,
}

impl Coordinator {
    /// Creates a coordinator with HTTP clients and limits from `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(CrawlerError)` - An HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, CrawlerError> {
        let policy = config.policy();
        Ok(Self::with_parts(
            ChainResolver::from_config(config)?,
            SitemapResolver::from_config(config)?,
            Scheduler::new(policy.concurrency),
        ))
    }

    /// Creates a coordinator from pre-built parts
    pub fn with_parts(resolver: ChainResolver, sitemaps: SitemapResolver, scheduler: Scheduler) -> Self {
        Self {
            resolver,
            sitemaps,
            scheduler,
        }
    }

    pub fn resolver(&self) -> &ChainResolver {
        &self.resolver
    }

    /// Discovers a site's sitemap entries and crawls all of them
    ///
    /// Only a malformed site input or a sitemap that cannot be found on any
    /// candidate URL is an error; per-URL failures are part of the report.
    pub async fn crawl_site(&self, site: &str) -> Result<CrawlReport, CrawlerError> {
        tracing::info!("Resolving sitemap for {}", site);
        let entries = self.sitemaps.resolve(site).await?;
        Ok(self.crawl_entries(&entries).await)
    }

    /// Crawls the given entries into a report
    pub async fn crawl_entries(&self, entries: &[SitemapEntry]) -> CrawlReport {
        let results = self.crawl_all(entries).await;
        CrawlReport::new(entries.len(), results)
    }

    /// Resolves every entry's redirect chain
    ///
    /// At most `concurrency` chains are resolved at once. The returned results
    /// are in input order, one per entry. An entry whose resolution fails or
    /// whose task panics gets a one-hop error chain instead.
    pub async fn crawl_all(&self, entries: &[SitemapEntry]) -> Vec<CrawlResult> {
        let started = Instant::now();
        tracing::info!(
            "Crawling {} URLs with concurrency {}",
            entries.len(),
            self.scheduler.limit()
        );

        let mut handles = Vec::with_capacity(entries.len());
        for entry in entries {
            let resolver = self.resolver.clone();
            let loc = entry.loc.clone();

            // Acquire before spawning so at most `limit` tasks exist at once
            let handle = match self.scheduler.acquire().await {
                Ok(permit) => tokio::spawn(async move {
                    let _permit = permit;
                    resolver.resolve(&loc).await
                }),
                Err(e) => tokio::spawn(async move { Err::<RedirectChain, _>(e) }),
            };
            handles.push(handle);
        }

        let mut results = Vec::with_capacity(entries.len());
        for (entry, handle) in entries.iter().zip(handles) {
            let result = match handle.await {
                Ok(Ok(chain)) => CrawlResult::from_entry(entry, chain),
                Ok(Err(e)) => {
                    tracing::warn!("Could not resolve {}: {}", entry.loc, e);
                    CrawlResult::failed(entry, e.to_string())
                }
                Err(e) => {
                    let error = CrawlerError::Task(e.to_string());
                    tracing::error!("{}: {}", entry.loc, error);
                    CrawlResult::failed(entry, error.to_string())
                }
            };
            results.push(result);

            if results.len() % PROGRESS_INTERVAL == 0 {
                let rate = results.len() as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} URLs crawled, {:.2} URLs/sec",
                    results.len(),
                    entries.len(),
                    rate
                );
            }
        }

        tracing::info!(
            "Crawl completed: {} URLs in {:?}",
            results.len(),
            started.elapsed()
        );

        results
    }

    /// Resolves one URL outside any sitemap
    ///
    /// A missing scheme defaults to `https://`. The result carries no sitemap
    /// metadata.
    pub async fn crawl_single(&self, url: &str) -> Result<CrawlResult, CrawlerError> {
        let start = ensure_scheme(url)?;
        let chain = self.resolver.resolve(start.as_str()).await?;
        Ok(CrawlResult::single(start.as_str(), chain))
    }

    /// Resolves two URLs concurrently and compares their scores
    pub async fn compare_sites(&self, site_a: &str, site_b: &str) -> Result<ComparisonReport, CrawlerError> {
        let url_a = ensure_scheme(site_a)?;
        let url_b = ensure_scheme(site_b)?;
        tracing::info!("Comparing {} with {}", url_a, url_b);

        let (chain_a, chain_b) = tokio::join!(
            self.resolver.resolve(url_a.as_str()),
            self.resolver.resolve(url_b.as_str())
        );

        let report = ComparisonReport::new(
            SiteComparison::new(url_a.as_str(), chain_a?),
            SiteComparison::new(url_b.as_str(), chain_b?),
        );
        tracing::info!(
            "Scores: {} = {}, {} = {}; winner: {}",
            report.site_a.url,
            report.site_a.score.total,
            report.site_b.url,
            report.site_b.score.total,
            report.winner
        );

        Ok(report)
    }
}

/// Runs a complete crawl of one site
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `site` - A domain or a full sitemap URL
///
/// # Example
///
/// ```no_run
/// use sitemap_crawler::config::Config;
/// use sitemap_crawler::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(&Config::default(), "example.com").await?;
/// println!("{} URLs crawled", report.processed);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, site: &str) -> Result<CrawlReport, CrawlerError> {
    Coordinator::new(config)?.crawl_site(site).await
}

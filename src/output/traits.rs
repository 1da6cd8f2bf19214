//! Output handler trait and report types
//!
//! Reports are the serializable results of the three crawl modes. An
//! `OutputHandler` renders any of them into a document.

use crate::crawler::{CrawlResult, RedirectChain};
use crate::scoring::{ScoreBreakdown, Winner};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Result of crawling every URL in a site's sitemap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    /// Number of sitemap entries found
    pub total: usize,
    /// Number of results produced; equals `total` for a finished crawl
    pub processed: usize,
    /// One result per entry, in sitemap order
    pub results: Vec<CrawlResult>,
    pub generated_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn new(total: usize, results: Vec<CrawlResult>) -> Self {
        Self {
            total,
            processed: results.len(),
            results,
            generated_at: Utc::now(),
        }
    }
}

/// One side of a two-site comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteComparison {
    pub url: String,
    pub chain: RedirectChain,
    pub score: ScoreBreakdown,
}

impl SiteComparison {
    /// Scores `chain` for the site at `url`
    pub fn new(url: impl Into<String>, chain: RedirectChain) -> Self {
        let score = chain.score();
        Self {
            url: url.into(),
            chain,
            score,
        }
    }
}

/// Result of comparing two sites' final pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub site_a: SiteComparison,
    pub site_b: SiteComparison,
    pub winner: Winner,
    pub generated_at: DateTime<Utc>,
}

impl ComparisonReport {
    /// Builds the report, picking the winner from the two totals
    pub fn new(site_a: SiteComparison, site_b: SiteComparison) -> Self {
        let winner = crate::scoring::compare_totals(site_a.score.total, site_b.score.total);
        Self {
            site_a,
            site_b,
            winner,
            generated_at: Utc::now(),
        }
    }
}

/// Renders reports into an output document
pub trait OutputHandler {
    /// Renders a full sitemap crawl
    fn render_crawl(&self, report: &CrawlReport) -> OutputResult<String>;

    /// Renders a single-URL resolution
    fn render_single(&self, result: &CrawlResult) -> OutputResult<String>;

    /// Renders a two-site comparison
    fn render_comparison(&self, report: &ComparisonReport) -> OutputResult<String>;
}

//! Sitemap Crawler: sitemap discovery, redirect-chain auditing and SEO scoring
//!
//! This crate discovers every URL a site's sitemap declares (following nested
//! sitemap indices), resolves each URL's redirect chain hop by hop, and scores
//! the final page's metadata.

pub mod config;
pub mod crawler;
pub mod output;
pub mod scoring;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("{0}")]
    Sitemap(#[from] SitemapError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Crawl task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

pub use sitemap::{SitemapError, SitemapFailure};

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlPolicy};
pub use crawler::{ChainResolver, Coordinator, CrawlResult, HopRecord, OgFlags, RedirectChain};
pub use scoring::{compare_totals, detect_issues, score_chain, Issue, ScoreBreakdown, Winner};
pub use sitemap::{SitemapEntry, SitemapResolver};
pub use state::HopState;
pub use url::{ensure_scheme, normalize_site_input};

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the sitemap crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds the runtime crawl policy from this configuration
    pub fn policy(&self) -> CrawlPolicy {
        CrawlPolicy {
            concurrency: self.crawler.concurrency as usize,
            timeout: Duration::from_millis(self.crawler.timeout_ms),
            max_hops: self.crawler.max_hops,
            max_retries_per_hop: self.crawler.max_retries_per_hop,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of redirect chains resolved at the same time
    pub concurrency: u32,

    /// Per-hop request timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Maximum number of hops fetched per redirect chain
    #[serde(rename = "max-hops")]
    pub max_hops: u32,

    /// Retries allowed for a single hop after a transport failure
    #[serde(rename = "max-retries-per-hop")]
    pub max_retries_per_hop: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout_ms: 10_000,
            max_hops: 10,
            max_retries_per_hop: 2,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value sent with every request
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SitemapCrawler".to_string(),
            crawler_version: "1.0".to_string(),
        }
    }
}

/// Sitemap discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Maximum nesting of sitemap indices that will be expanded
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Paths tried after `/sitemap.xml` yields no entries
    #[serde(rename = "fallback-paths")]
    pub fallback_paths: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            fallback_paths: vec![
                "/sitemap_index.xml".to_string(),
                "/wp-sitemap.xml".to_string(),
                "/sitemap.xml.gz".to_string(),
            ],
        }
    }
}

/// Report format written by the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format
    pub format: OutputFormat,

    /// Report destination; stdout when absent
    pub path: Option<String>,
}

/// Validated runtime policy threaded into the resolvers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlPolicy {
    /// Maximum number of resolutions in flight
    pub concurrency: usize,

    /// Per-hop request timeout
    pub timeout: Duration,

    /// Maximum number of hops fetched per chain
    pub max_hops: u32,

    /// Retries per hop after a transport failure
    pub max_retries_per_hop: u32,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Config::default().policy()
    }
}

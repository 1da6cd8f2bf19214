//! Configuration module for the sitemap crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a crawl can also run without any file at all.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawler will use concurrency: {}", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlPolicy, CrawlerConfig, OutputConfig, OutputFormat, SitemapConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;

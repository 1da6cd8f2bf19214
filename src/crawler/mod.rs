//! Crawler module for redirect-chain resolution and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of single hops with transport error classification
//! - HTML metadata extraction
//! - Per-URL redirect-chain resolution with per-hop retries
//! - Concurrency limiting and overall crawl coordination

mod chain;
mod coordinator;
mod fetcher;
mod metadata;
mod resolver;
mod scheduler;

pub use chain::{CrawlResult, HopRecord, OgFlags, RedirectChain};
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{
    build_http_client, build_sitemap_client, classify_transport_error, fetch_hop, FetchError,
    HopResponse, TransportErrorKind,
};
pub use metadata::{extract_metadata, PageMetadata};
pub use resolver::{ChainResolver, REDIRECT_LIMIT_MESSAGE};
pub use scheduler::Scheduler;

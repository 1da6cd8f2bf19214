//! Output module for crawl, single-URL and comparison reports
//!
//! This module handles:
//! - Report types serialized in the camelCase wire shape
//! - JSON and Markdown renderers behind the `OutputHandler` trait
//! - Crawl statistics for Markdown reports
//! - Writing a rendered document to a file or stdout

mod json;
mod markdown;
pub mod stats;
mod traits;

pub use json::JsonOutput;
pub use markdown::{format_comparison, format_crawl_report, MarkdownOutput};
pub use stats::CrawlStatistics;
pub use traits::{
    ComparisonReport, CrawlReport, OutputError, OutputHandler, OutputResult, SiteComparison,
};

use crate::config::OutputFormat;
use std::io::Write;
use std::path::Path;

/// Returns the renderer for a configured format
pub fn handler_for(format: OutputFormat) -> Box<dyn OutputHandler> {
    match format {
        OutputFormat::Json => Box::new(JsonOutput),
        OutputFormat::Markdown => Box::new(MarkdownOutput),
    }
}

/// Writes a rendered document to `path`, or to stdout when `path` is `None`
pub fn write_output(document: &str, path: Option<&Path>) -> OutputResult<()> {
    match path {
        Some(path) => {
            std::fs::write(path, document)
                .map_err(|e| OutputError::Write(format!("{}: {}", path.display(), e)))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(document.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

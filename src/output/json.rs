use crate::crawler::CrawlResult;
use crate::output::traits::{ComparisonReport, CrawlReport, OutputHandler, OutputResult};
use serde::Serialize;

/// Renders reports as pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn render<T: Serialize>(value: &T) -> OutputResult<String> {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        Ok(json)
    }
}

impl OutputHandler for JsonOutput {
    fn render_crawl(&self, report: &CrawlReport) -> OutputResult<String> {
        Self::render(report)
    }

    fn render_single(&self, result: &CrawlResult) -> OutputResult<String> {
        Self::render(result)
    }

    fn render_comparison(&self, report: &ComparisonReport) -> OutputResult<String> {
        Self::render(report)
    }
}

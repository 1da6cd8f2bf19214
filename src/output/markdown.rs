//! Markdown report generation
//!
//! Human-readable reports: per-URL redirect chains, scores and issues, plus
//! crawl statistics for full sitemap crawls.

use crate::crawler::{CrawlResult, RedirectChain};
use crate::output::stats::CrawlStatistics;
use crate::output::traits::{ComparisonReport, CrawlReport, OutputHandler, OutputResult, SiteComparison};
use crate::scoring::{Metric, MAX_TOTAL};
use std::fmt::Write;

/// Renders reports as Markdown
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownOutput;

impl OutputHandler for MarkdownOutput {
    fn render_crawl(&self, report: &CrawlReport) -> OutputResult<String> {
        Ok(format_crawl_report(report))
    }

    fn render_single(&self, result: &CrawlResult) -> OutputResult<String> {
        let mut md = String::from("# Redirect Chain Report\n\n");
        write_result(&mut md, result);
        Ok(md)
    }

    fn render_comparison(&self, report: &ComparisonReport) -> OutputResult<String> {
        Ok(format_comparison(report))
    }
}

/// Formats a full crawl report
pub fn format_crawl_report(report: &CrawlReport) -> String {
    let mut md = String::new();
    let stats = CrawlStatistics::from_results(&report.results);

    md.push_str("# Sitemap Crawl Report\n\n");
    let _ = writeln!(md, "- **Generated**: {}", report.generated_at.to_rfc3339());
    let _ = writeln!(md, "- **URLs in sitemap**: {}", report.total);
    let _ = writeln!(md, "- **URLs processed**: {}\n", report.processed);

    write_statistics(&mut md, &stats);

    md.push_str("## Results\n\n");
    for result in &report.results {
        write_result(&mut md, result);
    }

    md
}

/// Formats a two-site comparison
pub fn format_comparison(report: &ComparisonReport) -> String {
    let mut md = String::from("# Site Comparison\n\n");

    md.push_str("| Metric | Site A | Site B |\n");
    md.push_str("|--------|--------|--------|\n");
    let _ = writeln!(md, "| URL | {} | {} |", report.site_a.url, report.site_b.url);
    for metric in Metric::ALL {
        let _ = writeln!(
            md,
            "| {} | {} | {} |",
            metric,
            report.site_a.score.points(metric),
            report.site_b.score.points(metric)
        );
    }
    let _ = writeln!(
        md,
        "| **Total** | **{}/{}** | **{}/{}** |\n",
        report.site_a.score.total, MAX_TOTAL, report.site_b.score.total, MAX_TOTAL
    );
    let _ = writeln!(md, "**Winner**: {}\n", report.winner);

    write_site(&mut md, "Site A", &report.site_a);
    write_site(&mut md, "Site B", &report.site_b);

    md
}

fn write_statistics(md: &mut String, stats: &CrawlStatistics) {
    md.push_str("## Statistics\n\n");
    let _ = writeln!(md, "- **Average score**: {:.1}/{}", stats.average_score, MAX_TOTAL);
    let _ = writeln!(md, "- **Success rate**: {:.1}%", stats.success_rate());
    let _ = writeln!(md, "- **Redirected URLs**: {}", stats.redirected);
    let _ = writeln!(md, "- **Network failures**: {}\n", stats.errored);

    if !stats.status_classes.is_empty() {
        md.push_str("| Final Status | Count |\n");
        md.push_str("|--------------|-------|\n");
        for (class, count) in &stats.status_classes {
            let _ = writeln!(md, "| {} | {} |", class, count);
        }
        md.push('\n');
    }

    if !stats.issues_by_severity.is_empty() {
        md.push_str("| Severity | Issues |\n");
        md.push_str("|----------|--------|\n");
        for (severity, count) in &stats.issues_by_severity {
            let _ = writeln!(md, "| {} | {} |", severity, count);
        }
        md.push('\n');
    }
}

fn write_site(md: &mut String, label: &str, site: &SiteComparison) {
    let _ = writeln!(md, "## {}: {}\n", label, site.url);
    write_chain(md, &site.chain);
}

fn write_result(md: &mut String, result: &CrawlResult) {
    let _ = writeln!(md, "### {}\n", result.original_url);
    if let Some(lastmod) = &result.last_modified {
        let _ = writeln!(md, "- **Last modified**: {}", lastmod);
    }
    if let Some(priority) = result.priority {
        let _ = writeln!(md, "- **Priority**: {}", priority);
    }
    write_chain(md, &result.chain);
}

fn write_chain(md: &mut String, chain: &RedirectChain) {
    let score = chain.score();
    let _ = writeln!(md, "- **Score**: {}/{}", score.total, MAX_TOTAL);
    let _ = writeln!(md, "- **Hops**: {}\n", chain.len());

    if !chain.is_empty() {
        md.push_str("| # | URL | Status | Time (ms) |\n");
        md.push_str("|---|-----|--------|-----------|\n");
        for (i, hop) in chain.hops().iter().enumerate() {
            let status = match (hop.status_code, hop.error.as_deref()) {
                (_, Some(error)) => format!("error: {}", error),
                (Some(code), None) => code.to_string(),
                (None, None) => "-".to_string(),
            };
            let _ = writeln!(md, "| {} | {} | {} | {} |", i + 1, hop.url, status, hop.response_time_ms);
        }
        md.push('\n');
    }

    if let Some(hop) = chain.final_hop() {
        if let Some(title) = &hop.page_title {
            let _ = writeln!(md, "- **Title**: {}", title);
        }
        if let Some(description) = &hop.meta_description {
            let _ = writeln!(md, "- **Description**: {}", description);
        }
    }

    let issues = chain.issues();
    if !issues.is_empty() {
        md.push_str("\n**Issues**\n\n");
        for issue in issues {
            let _ = writeln!(md, "- [{}] {} ({}): {}", issue.severity, issue.kind, issue.category, issue.message);
        }
    }
    md.push('\n');
}

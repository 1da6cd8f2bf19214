//! Statistics computed over a crawl's results

use crate::crawler::CrawlResult;
use crate::scoring::Severity;
use std::collections::BTreeMap;

/// Aggregate figures for a crawl report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Number of results
    pub total_urls: usize,

    /// Final-hop status classes ("2xx", "3xx", ..., "error")
    pub status_classes: BTreeMap<String, usize>,

    /// Results whose chain has more than one hop
    pub redirected: usize,

    /// Results whose final hop failed at the network level
    pub errored: usize,

    /// Mean score total across results
    pub average_score: f64,

    /// Issue counts across all results
    pub issues_by_severity: BTreeMap<Severity, usize>,
}

impl CrawlStatistics {
    /// Computes statistics from crawl results
    pub fn from_results(results: &[CrawlResult]) -> Self {
        let mut stats = Self {
            total_urls: results.len(),
            ..Self::default()
        };
        let mut score_sum: u64 = 0;

        for result in results {
            let chain = &result.chain;
            if chain.len() > 1 {
                stats.redirected += 1;
            }

            let class = match chain.final_hop() {
                Some(hop) if hop.is_error() => {
                    stats.errored += 1;
                    "error".to_string()
                }
                Some(hop) => match hop.status_code {
                    Some(status) => format!("{}xx", status / 100),
                    None => "error".to_string(),
                },
                None => "empty".to_string(),
            };
            *stats.status_classes.entry(class).or_insert(0) += 1;

            score_sum += u64::from(chain.score().total);
            for issue in chain.issues() {
                *stats.issues_by_severity.entry(issue.severity).or_insert(0) += 1;
            }
        }

        if !results.is_empty() {
            stats.average_score = score_sum as f64 / results.len() as f64;
        }

        stats
    }

    /// Percentage of results whose final status is 2xx
    pub fn success_rate(&self) -> f64 {
        if self.total_urls == 0 {
            return 0.0;
        }
        let ok = self.status_classes.get("2xx").copied().unwrap_or(0);
        (ok as f64 / self.total_urls as f64) * 100.0
    }
}

use crate::crawler::{HopRecord, RedirectChain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Inclusive optimal title length, in characters
pub const TITLE_OPTIMAL: (usize, usize) = (50, 70);

/// Inclusive optimal meta description length, in characters
pub const DESCRIPTION_OPTIMAL: (usize, usize) = (150, 160);

/// Highest possible total
pub const MAX_TOTAL: u32 = 80;

/// A scored metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Title,
    MetaDescription,
    Redirects,
    Speed,
    Https,
    OgTags,
    H1,
    Canonical,
}

impl Metric {
    /// All metrics in rubric order
    pub const ALL: [Metric; 8] = [
        Metric::Title,
        Metric::MetaDescription,
        Metric::Redirects,
        Metric::Speed,
        Metric::Https,
        Metric::OgTags,
        Metric::H1,
        Metric::Canonical,
    ];

    /// Maximum points this metric can award
    pub fn max_points(&self) -> u32 {
        match self {
            Self::Redirects | Self::Speed => 15,
            Self::Title | Self::MetaDescription | Self::Https | Self::OgTags => 10,
            Self::H1 | Self::Canonical => 5,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::MetaDescription => "Meta Description",
            Self::Redirects => "Redirects",
            Self::Speed => "Speed",
            Self::Https => "HTTPS",
            Self::OgTags => "Open Graph Tags",
            Self::H1 => "H1",
            Self::Canonical => "Canonical",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Points per metric plus their sum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub breakdown: BTreeMap<Metric, u32>,
}

impl ScoreBreakdown {
    /// Points awarded for a metric; 0 when the metric was not scored
    pub fn points(&self, metric: Metric) -> u32 {
        self.breakdown.get(&metric).copied().unwrap_or(0)
    }
}

/// Scores a redirect chain from its final hop
///
/// An empty chain scores 0 with an empty breakdown.
pub fn score_chain(chain: &RedirectChain) -> ScoreBreakdown {
    let Some(final_hop) = chain.final_hop() else {
        return ScoreBreakdown::default();
    };

    let breakdown: BTreeMap<Metric, u32> = Metric::ALL
        .iter()
        .map(|metric| (*metric, score_metric(*metric, final_hop, chain.len())))
        .collect();

    ScoreBreakdown {
        total: breakdown.values().sum(),
        breakdown,
    }
}

fn score_metric(metric: Metric, hop: &HopRecord, chain_len: usize) -> u32 {
    match metric {
        Metric::Title => length_points(hop.page_title.as_deref(), TITLE_OPTIMAL),
        Metric::MetaDescription => length_points(hop.meta_description.as_deref(), DESCRIPTION_OPTIMAL),
        Metric::Redirects => redirect_points(hop, chain_len),
        Metric::Speed => speed_points(hop.response_time_ms),
        Metric::Https => {
            if hop.is_https {
                10
            } else {
                0
            }
        }
        Metric::OgTags => match hop.og_flags.count() {
            3 => 10,
            0 => 0,
            _ => 5,
        },
        Metric::H1 => {
            if hop.h1.as_deref().is_some_and(|h| !h.trim().is_empty()) {
                5
            } else {
                0
            }
        }
        Metric::Canonical => {
            if hop.canonical_url.is_some() {
                5
            } else {
                0
            }
        }
    }
}

fn length_points(value: Option<&str>, (min, max): (usize, usize)) -> u32 {
    match value {
        Some(text) if (min..=max).contains(&text.chars().count()) => 10,
        Some(_) => 5,
        None => 0,
    }
}

fn redirect_points(final_hop: &HopRecord, chain_len: usize) -> u32 {
    let failed = final_hop.is_error() || final_hop.status_code.map_or(true, |s| s >= 400);
    if failed {
        return 0;
    }

    match chain_len {
        1 => 15,
        2 => 10,
        _ => 5,
    }
}

fn speed_points(response_time_ms: u64) -> u32 {
    match response_time_ms {
        0..=499 => 15,
        500..=999 => 10,
        1000..=1999 => 5,
        _ => 0,
    }
}

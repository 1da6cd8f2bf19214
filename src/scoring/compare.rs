use serde::{Deserialize, Serialize};
use std::fmt;

/// Totals within this many points of each other are a close call
pub const CLOSE_MARGIN: u32 = 10;

/// Outcome of comparing two sites' scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "siteA")]
    SiteA,
    #[serde(rename = "siteB")]
    SiteB,
    #[serde(rename = "close")]
    Close,
    /// Reserved; equal totals always fall inside the close margin
    #[serde(rename = "tie")]
    Tie,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SiteA => "siteA",
            Self::SiteB => "siteB",
            Self::Close => "close",
            Self::Tie => "tie",
        };
        f.write_str(label)
    }
}

/// Picks a winner from two score totals
///
/// # Example
///
/// ```
/// use sitemap_crawler::{compare_totals, Winner};
///
/// assert_eq!(compare_totals(20, 60), Winner::SiteB);
/// assert_eq!(compare_totals(40, 48), Winner::Close);
/// ```
pub fn compare_totals(a: u32, b: u32) -> Winner {
    if a.abs_diff(b) <= CLOSE_MARGIN {
        Winner::Close
    } else if a > b {
        Winner::SiteA
    } else {
        Winner::SiteB
    }
}

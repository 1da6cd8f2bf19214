//! SEO scoring and issue detection
//!
//! Everything here is a pure function of a `RedirectChain`:
//! - `score_chain` awards up to 80 points across eight metrics
//! - `detect_issues` lists problems with their severity and category
//! - `compare_totals` picks a winner between two sites

mod compare;
mod issues;
mod rubric;

pub use compare::{compare_totals, Winner, CLOSE_MARGIN};
pub use issues::{detect_issues, Category, Issue, IssueKind, Severity};
pub use rubric::{score_chain, Metric, ScoreBreakdown, DESCRIPTION_OPTIMAL, MAX_TOTAL, TITLE_OPTIMAL};

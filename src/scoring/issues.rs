//! Issue detection
//!
//! Issues are derived from the final hop of a chain plus the chain's shape.
//! Page-content checks run whenever the final hop received an HTTP response;
//! a hop that failed at the network level only reports its network issue.

use crate::crawler::{HopRecord, RedirectChain, TransportErrorKind, REDIRECT_LIMIT_MESSAGE};
use crate::scoring::rubric::{DESCRIPTION_OPTIMAL, TITLE_OPTIMAL};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chains longer than this many hops are flagged as long
pub const LONG_CHAIN_HOPS: usize = 3;

/// Final-hop response times above this are flagged as slow
pub const SLOW_RESPONSE_MS: u64 = 1000;

/// Final-hop response times above this are flagged as very slow
pub const VERY_SLOW_RESPONSE_MS: u64 = 2000;

/// Stable identifier of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    MissingTitle,
    TitleTooLong,
    TitleTooShort,
    MissingMetaDescription,
    MetaDescriptionTooLong,
    MetaDescriptionTooShort,
    MissingH1,
    MissingCanonical,
    MissingHreflang,
    IncompleteOgTags,
    NotHttps,
    RedirectLoop,
    LongRedirectChain,
    RedirectChain,
    RedirectLimitExceeded,
    SlowResponse,
    HttpClientError,
    HttpServerError,
    NetworkTimeout,
    DnsFailure,
    ConnectionRefused,
    NetworkError,
}

impl IssueKind {
    /// The identifier as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTitle => "missing-title",
            Self::TitleTooLong => "title-too-long",
            Self::TitleTooShort => "title-too-short",
            Self::MissingMetaDescription => "missing-meta-description",
            Self::MetaDescriptionTooLong => "meta-description-too-long",
            Self::MetaDescriptionTooShort => "meta-description-too-short",
            Self::MissingH1 => "missing-h1",
            Self::MissingCanonical => "missing-canonical",
            Self::MissingHreflang => "missing-hreflang",
            Self::IncompleteOgTags => "incomplete-og-tags",
            Self::NotHttps => "not-https",
            Self::RedirectLoop => "redirect-loop",
            Self::LongRedirectChain => "long-redirect-chain",
            Self::RedirectChain => "redirect-chain",
            Self::RedirectLimitExceeded => "redirect-limit-exceeded",
            Self::SlowResponse => "slow-response",
            Self::HttpClientError => "http-client-error",
            Self::HttpServerError => "http-server-error",
            Self::NetworkTimeout => "network-timeout",
            Self::DnsFailure => "dns-failure",
            Self::ConnectionRefused => "connection-refused",
            Self::NetworkError => "network-error",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Content,
    Technical,
    Security,
    Localization,
    Social,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Content => "content",
            Self::Technical => "technical",
            Self::Security => "security",
            Self::Localization => "localization",
            Self::Social => "social",
        };
        f.write_str(label)
    }
}

/// A detected problem with a crawled URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
}

impl Issue {
    fn new(kind: IssueKind, severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            category,
            message: message.into(),
        }
    }
}

/// Detects issues on a chain
///
/// Issues are returned in a fixed order: chain-level issues first, then the
/// final hop's transport and HTTP issues, then page-content issues. An empty
/// chain has no issues.
///
/// # Example
///
/// ```
/// use sitemap_crawler::{detect_issues, HopRecord, RedirectChain};
/// use sitemap_crawler::scoring::{IssueKind, Severity};
///
/// let chain = RedirectChain::from(vec![
///     HopRecord::response("https://a.example/", 301, 10, None, None, None),
///     HopRecord::response("https://b.example/", 302, 20, None, None, None),
///     HopRecord::response("https://a.example/", 301, 30, None, None, None),
/// ]);
/// let loop_issue = detect_issues(&chain)
///     .into_iter()
///     .find(|issue| issue.kind == IssueKind::RedirectLoop)
///     .unwrap();
/// assert_eq!(loop_issue.severity, Severity::Critical);
/// ```
pub fn detect_issues(chain: &RedirectChain) -> Vec<Issue> {
    let Some(final_hop) = chain.final_hop() else {
        return Vec::new();
    };

    let mut issues = Vec::new();
    chain_issues(chain, &mut issues);

    if let Some(error) = final_hop.error.as_deref() {
        issues.push(network_issue(error));
    } else if let Some(status) = final_hop.status_code {
        status_issues(status, &mut issues);
    }

    if !final_hop.is_https {
        issues.push(Issue::new(
            IssueKind::NotHttps,
            Severity::High,
            Category::Security,
            "Page is not served over HTTPS",
        ));
    }

    if !final_hop.is_error() && final_hop.response_time_ms > SLOW_RESPONSE_MS {
        let severity = if final_hop.response_time_ms > VERY_SLOW_RESPONSE_MS {
            Severity::High
        } else {
            Severity::Medium
        };
        issues.push(Issue::new(
            IssueKind::SlowResponse,
            severity,
            Category::Technical,
            format!("Slow response ({}ms)", final_hop.response_time_ms),
        ));
    }

    if has_page(final_hop) {
        content_issues(final_hop, &mut issues);
    }

    issues
}

fn has_page(hop: &HopRecord) -> bool {
    !hop.is_error() && hop.status_code.is_some()
}

fn chain_issues(chain: &RedirectChain, issues: &mut Vec<Issue>) {
    if chain.has_loop() {
        issues.push(Issue::new(
            IssueKind::RedirectLoop,
            Severity::Critical,
            Category::Technical,
            "Redirect loop detected: a URL appears more than once in the chain",
        ));
    }

    let hops = chain.len();
    if hops > LONG_CHAIN_HOPS {
        issues.push(Issue::new(
            IssueKind::LongRedirectChain,
            Severity::Medium,
            Category::Technical,
            format!("Long redirect chain ({} hops)", hops),
        ));
    } else if hops > 1 {
        issues.push(Issue::new(
            IssueKind::RedirectChain,
            Severity::Low,
            Category::Technical,
            format!("URL redirects ({} hops)", hops),
        ));
    }
}

fn status_issues(status: u16, issues: &mut Vec<Issue>) {
    match status {
        400..=499 => issues.push(Issue::new(
            IssueKind::HttpClientError,
            Severity::High,
            Category::Technical,
            format!("Final page returned HTTP {}", status),
        )),
        500..=599 => issues.push(Issue::new(
            IssueKind::HttpServerError,
            Severity::Critical,
            Category::Technical,
            format!("Final page returned HTTP {}", status),
        )),
        _ => {}
    }
}

/// Maps a hop error message onto a network issue
///
/// The kind comes from the message's leading label only; the rest of the
/// message quotes the request URL and is never searched.
fn network_issue(error: &str) -> Issue {
    if error.starts_with(REDIRECT_LIMIT_MESSAGE) {
        return Issue::new(IssueKind::RedirectLimitExceeded, Severity::High, Category::Technical, error);
    }

    let kind = match TransportErrorKind::from_message(error) {
        Some(TransportErrorKind::Timeout) => IssueKind::NetworkTimeout,
        Some(TransportErrorKind::Dns) => IssueKind::DnsFailure,
        Some(TransportErrorKind::ConnectionRefused) => IssueKind::ConnectionRefused,
        _ => IssueKind::NetworkError,
    };

    Issue::new(kind, Severity::Critical, Category::Technical, error)
}

fn content_issues(hop: &HopRecord, issues: &mut Vec<Issue>) {
    length_issues(
        hop.page_title.as_deref(),
        TITLE_OPTIMAL,
        [IssueKind::MissingTitle, IssueKind::TitleTooLong, IssueKind::TitleTooShort],
        "Title",
        issues,
    );
    length_issues(
        hop.meta_description.as_deref(),
        DESCRIPTION_OPTIMAL,
        [
            IssueKind::MissingMetaDescription,
            IssueKind::MetaDescriptionTooLong,
            IssueKind::MetaDescriptionTooShort,
        ],
        "Meta description",
        issues,
    );

    if hop.h1.as_deref().map_or(true, |h| h.trim().is_empty()) {
        issues.push(Issue::new(IssueKind::MissingH1, Severity::Medium, Category::Content, "Missing H1 heading"));
    }

    if hop.canonical_url.is_none() {
        issues.push(Issue::new(
            IssueKind::MissingCanonical,
            Severity::Medium,
            Category::Technical,
            "Missing canonical link",
        ));
    }

    if hop.hreflang_count == 0 {
        issues.push(Issue::new(
            IssueKind::MissingHreflang,
            Severity::Low,
            Category::Localization,
            "No hreflang alternate links",
        ));
    }

    let missing = hop.og_flags.missing();
    if !missing.is_empty() {
        issues.push(Issue::new(
            IssueKind::IncompleteOgTags,
            Severity::Low,
            Category::Social,
            format!("Missing Open Graph tags: {}", missing.join(", ")),
        ));
    }
}

/// `kinds` is `[missing, too long, too short]`
fn length_issues(
    value: Option<&str>,
    (min, max): (usize, usize),
    kinds: [IssueKind; 3],
    label: &str,
    issues: &mut Vec<Issue>,
) {
    let [missing, too_long, too_short] = kinds;
    let Some(text) = value else {
        issues.push(Issue::new(missing, Severity::High, Category::Content, format!("Missing {}", label.to_lowercase())));
        return;
    };

    let chars = text.chars().count();
    if chars > max {
        issues.push(Issue::new(
            too_long,
            Severity::Medium,
            Category::Content,
            format!("{} too long ({} chars). Optimal: {}-{}", label, chars, min, max),
        ));
    } else if chars < min {
        issues.push(Issue::new(
            too_short,
            Severity::Low,
            Category::Content,
            format!("{} too short ({} chars). Optimal: {}-{}", label, chars, min, max),
        ));
    }
}

//! Sitemap resolution errors
//!
//! A failure on one candidate URL is a `SitemapFailure`; only exhausting every
//! candidate surfaces as a `SitemapError` to the caller.

use crate::crawler::{FetchError, TransportErrorKind};
use crate::UrlError;
use std::fmt;
use thiserror::Error;

/// Why a single sitemap candidate produced no entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapFailure {
    /// HTTP 404
    NotFound,
    /// HTTP 401 or 403
    AccessDenied(u16),
    /// HTTP 429
    RateLimited,
    /// Any other non-success status
    HttpStatus(u16),
    /// The host name could not be resolved
    DnsNotFound,
    /// The server refused the connection
    ConnectionRefused,
    /// The request timed out
    Timeout,
    /// Other transport failure
    Network(String),
    /// The document could not be parsed
    Parse(String),
    /// The document was fetched but contained no entries
    Empty,
}

impl SitemapFailure {
    /// Maps a non-success HTTP status to a failure category
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::AccessDenied(status),
            429 => Self::RateLimited,
            other => Self::HttpStatus(other),
        }
    }
}

impl From<FetchError> for SitemapFailure {
    fn from(error: FetchError) -> Self {
        match error.kind {
            TransportErrorKind::Dns => Self::DnsNotFound,
            TransportErrorKind::ConnectionRefused => Self::ConnectionRefused,
            TransportErrorKind::Timeout => Self::Timeout,
            _ => Self::Network(error.to_string()),
        }
    }
}

impl fmt::Display for SitemapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "sitemap not found (HTTP 404)"),
            Self::AccessDenied(status) => {
                write!(f, "access denied (HTTP {}); the site may block crawlers", status)
            }
            Self::RateLimited => write!(f, "rate limited by the server (HTTP 429)"),
            Self::HttpStatus(status) => write!(f, "server responded with HTTP {}", status),
            Self::DnsNotFound => write!(f, "domain could not be resolved; check the spelling"),
            Self::ConnectionRefused => write!(f, "connection refused by the server"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Network(detail) => write!(f, "network error: {}", detail),
            Self::Parse(detail) => write!(f, "could not parse sitemap: {}", detail),
            Self::Empty => write!(f, "no URLs found in document"),
        }
    }
}

/// One candidate URL that was tried and why it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapAttempt {
    pub url: String,
    pub failure: SitemapFailure,
}

/// Errors surfaced by sitemap resolution
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Invalid site input: {0}")]
    InvalidInput(#[from] UrlError),

    #[error("{}", describe_attempts(.attempts))]
    NotFound { attempts: Vec<SitemapAttempt> },
}

impl SitemapError {
    /// URLs tried before giving up, in order
    pub fn attempted_urls(&self) -> Vec<&str> {
        match self {
            Self::NotFound { attempts } => attempts.iter().map(|a| a.url.as_str()).collect(),
            Self::InvalidInput(_) => Vec::new(),
        }
    }
}

fn describe_attempts(attempts: &[SitemapAttempt]) -> String {
    let mut message = String::from("No sitemap found. Tried:");
    for attempt in attempts {
        message.push_str(&format!("\n  - {} ({})", attempt.url, attempt.failure));
    }
    message
}

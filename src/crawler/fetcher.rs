//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the crawler's user agent string
//! - Single-hop GET requests with redirects disabled at the transport level
//! - Transport error classification (timeout, DNS, connection refused)

use crate::config::UserAgentConfig;
use reqwest::{header, redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Maximum redirects followed when fetching sitemap documents
const SITEMAP_REDIRECT_LIMIT: usize = 10;

/// Category of a request that failed before producing an HTTP response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The request did not complete within the per-hop timeout
    Timeout,
    /// The host name could not be resolved
    Dns,
    /// The server actively refused the connection
    ConnectionRefused,
    /// Any other connection failure (TLS, reset, unreachable)
    Connect,
    /// The response body could not be read or decoded
    Body,
    /// Anything else reported by the HTTP client
    Other,
}

impl TransportErrorKind {
    pub const ALL: [TransportErrorKind; 6] = [
        Self::Timeout,
        Self::Dns,
        Self::ConnectionRefused,
        Self::Connect,
        Self::Body,
        Self::Other,
    ];

    /// Prefix of every `FetchError` message of this kind
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout => "Request timeout",
            Self::Dns => "DNS lookup failed",
            Self::ConnectionRefused => "Connection refused",
            Self::Connect => "Connection failed",
            Self::Body => "Failed to read response body",
            Self::Other => "Request failed",
        }
    }

    /// Recovers the kind from a message produced by `FetchError`'s `Display`
    ///
    /// Only the leading label is inspected, never the detail text, which
    /// contains the request URL.
    pub fn from_message(message: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| message.starts_with(kind.label()))
    }
}

/// A request that failed at the transport level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: TransportErrorKind,
    pub detail: String,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.detail)
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        classify_transport_error(&error)
    }
}

/// Response of a single hop
#[derive(Debug, Clone)]
pub struct HopResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Content-Length header value
    pub content_length: Option<u64>,
    /// Raw Location header value
    pub location: Option<String>,
    /// Page body, only read for HTML responses
    pub body: Option<String>,
    /// Set when the status arrived but the HTML body could not be read
    pub body_error: Option<FetchError>,
}

impl HopResponse {
    /// Returns true if the Content-Type indicates an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Builds the HTTP client used for redirect-chain resolution
///
/// Redirects are never followed by the client; the resolver records every hop.
///
/// # Example
///
/// ```no_run
/// use sitemap_crawler::config::UserAgentConfig;
/// use sitemap_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the HTTP client used for sitemap documents, which follows redirects
pub fn build_sitemap_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .redirect(Policy::limited(SITEMAP_REDIRECT_LIMIT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues a single GET for one hop of a redirect chain
///
/// Every HTTP status is returned as a response; only transport failures are
/// errors. The body is read only when the response is HTML; if that read
/// fails the status is still returned, with the failure in `body_error`.
pub async fn fetch_hop(client: &Client, url: &Url, timeout: Duration) -> Result<HopResponse, FetchError> {
    let response = client.get(url.clone()).timeout(timeout).send().await?;

    let headers = response.headers();
    let content_type = header_string(headers, header::CONTENT_TYPE);
    let content_length = header_string(headers, header::CONTENT_LENGTH)
        .and_then(|value| value.trim().parse::<u64>().ok());
    let location = header_string(headers, header::LOCATION);

    let mut hop = HopResponse {
        status_code: response.status().as_u16(),
        content_type,
        content_length,
        location,
        body: None,
        body_error: None,
    };

    // The status is already known here, so a broken body does not fail the hop
    if hop.is_html() {
        match response.text().await {
            Ok(body) => hop.body = Some(body),
            Err(e) => hop.body_error = Some(classify_transport_error(&e)),
        }
    }

    Ok(hop)
}

fn header_string(headers: &header::HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Classifies a `reqwest::Error` into a transport failure category
///
/// The whole source chain is inspected because DNS and connection-refused
/// details live in the inner I/O error.
pub fn classify_transport_error(error: &reqwest::Error) -> FetchError {
    let detail = error_chain(error);
    let lower = detail.to_ascii_lowercase();

    let kind = if error.is_timeout() || lower.contains("timed out") {
        TransportErrorKind::Timeout
    } else if is_dns_failure(&lower) {
        TransportErrorKind::Dns
    } else if lower.contains("connection refused") {
        TransportErrorKind::ConnectionRefused
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_body() || error.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Other
    };

    FetchError { kind, detail }
}

fn is_dns_failure(lower: &str) -> bool {
    lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
        || lower.contains("nodename nor servname")
        || lower.contains("no such host")
}

/// Joins an error with all of its sources
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

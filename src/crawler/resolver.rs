//! Redirect-chain resolver
//!
//! Follows one URL hop by hop, recording every response. Transport failures
//! are retried on the same hop with a linear backoff driven by `HopState`.

use crate::config::{Config, CrawlPolicy};
use crate::crawler::chain::{HopRecord, RedirectChain};
use crate::crawler::fetcher::{build_http_client, fetch_hop};
use crate::crawler::metadata::extract_metadata;
use crate::state::HopState;
use crate::url::resolve_location;
use crate::{CrawlerError, UrlError};
use reqwest::Client;
use std::time::Instant;
use url::Url;

/// Error text of the terminal record appended when the hop budget runs out
pub const REDIRECT_LIMIT_MESSAGE: &str = "Too many redirects";

/// Resolves redirect chains with a fixed policy
#[derive(Debug, Clone)]
pub struct ChainResolver {
    client: Client,
    policy: CrawlPolicy,
}

impl ChainResolver {
    /// Creates a resolver from a client that does not follow redirects
    pub fn new(client: Client, policy: CrawlPolicy) -> Self {
        Self { client, policy }
    }

    /// Creates a resolver with its own client built from the configuration
    pub fn from_config(config: &Config) -> Result<Self, CrawlerError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::new(client, config.policy()))
    }

    pub fn policy(&self) -> &CrawlPolicy {
        &self.policy
    }

    /// Resolves the redirect chain starting at `url`
    ///
    /// Every HTTP status ends up in the chain; transport failures that outlive
    /// the retry budget become a terminal error hop. Only a start URL that is
    /// not an absolute http(s) URL is an error.
    ///
    /// # Returns
    ///
    /// * `Ok(RedirectChain)` - The hops from `url` to its final response
    /// * `Err(CrawlerError)` - `url` could not be parsed
    pub async fn resolve(&self, url: &str) -> Result<RedirectChain, CrawlerError> {
        let mut current = parse_start_url(url)?;
        let mut chain = RedirectChain::new();
        let mut state = HopState::start();
        let mut hop_count: u32 = 0;
        let started = Instant::now();

        loop {
            match state {
                HopState::Terminal => break,

                HopState::Retrying { .. } => {
                    if let Some(delay) = state.backoff() {
                        tokio::time::sleep(delay).await;
                    }
                    state = state.after_backoff();
                }

                HopState::Fetching { attempt } => {
                    if hop_count >= self.policy.max_hops {
                        tracing::warn!("Redirect limit of {} reached at {}", self.policy.max_hops, current);
                        chain.push(HopRecord::failure(
                            current.as_str(),
                            elapsed_ms(started),
                            format!("{} (max {})", REDIRECT_LIMIT_MESSAGE, self.policy.max_hops),
                        ));
                        state = HopState::Terminal;
                        continue;
                    }

                    tracing::debug!("GET {} (hop {}, {})", current, hop_count, state);

                    let response = match fetch_hop(&self.client, &current, self.policy.timeout).await {
                        Ok(response) => response,
                        Err(error) => {
                            state = state.after_failure(self.policy.max_retries_per_hop);
                            if state.is_terminal() {
                                tracing::warn!("{} failed after {} attempts: {}", current, attempt + 1, error);
                                chain.push(HopRecord::failure(current.as_str(), elapsed_ms(started), error.to_string()));
                            } else {
                                tracing::warn!("{} failed, {}: {}", current, state, error);
                            }
                            continue;
                        }
                    };

                    if let Some(error) = &response.body_error {
                        tracing::warn!("{} returned {} with an unreadable body: {}", current, response.status_code, error);
                    }

                    let metadata = response.body.as_deref().map(extract_metadata);
                    let record = HopRecord::response(
                        current.as_str(),
                        response.status_code,
                        elapsed_ms(started),
                        response.content_type,
                        response.content_length,
                        metadata,
                    );
                    let redirected = record.is_redirect();
                    chain.push(record);

                    if !redirected {
                        state = HopState::Terminal;
                        continue;
                    }

                    let Some(location) = response.location else {
                        tracing::warn!("{} redirected without a Location header", current);
                        state = HopState::Terminal;
                        continue;
                    };

                    match resolve_location(&current, &location) {
                        Ok(next) => {
                            tracing::debug!("{} -> {}", current, next);
                            current = next;
                            hop_count += 1;
                            state = state.after_redirect();
                        }
                        Err(e) => {
                            tracing::warn!("{} has an unusable Location {:?}: {}", current, location, e);
                            state = HopState::Terminal;
                        }
                    }
                }
            }
        }

        Ok(chain)
    }
}

/// Parses an absolute http(s) URL
fn parse_start_url(url: &str) -> Result<Url, CrawlerError> {
    let parsed = Url::parse(url.trim())?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(UrlError::InvalidScheme(other.to_string()).into()),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

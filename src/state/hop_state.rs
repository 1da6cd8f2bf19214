/// Hop state definitions for the redirect-chain retry loop
///
/// A hop is fetched, retried after transport failures with a linear backoff,
/// and eventually reaches a terminal state that ends the chain.
use std::fmt;
use std::time::Duration;

/// Base delay multiplied by the attempt number between retries
pub const BACKOFF_STEP: Duration = Duration::from_millis(1000);

/// Represents where the resolver is within the current hop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HopState {
    /// A GET for the current URL is about to be issued
    Fetching {
        /// Transport failures already seen on this hop
        attempt: u32,
    },

    /// The last GET failed at the transport level; waiting before refetching
    Retrying {
        /// Transport failures seen on this hop, including the last one
        attempt: u32,
    },

    /// The chain is complete; no further requests are made
    Terminal,
}

impl HopState {
    /// State at the start of a chain
    pub fn start() -> Self {
        Self::Fetching { attempt: 0 }
    }

    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// Transition after a transport failure on the current hop
    ///
    /// Stays on the same hop while the retry budget allows it.
    pub fn after_failure(self, max_retries: u32) -> Self {
        match self {
            Self::Fetching { attempt } | Self::Retrying { attempt } => {
                let attempt = attempt + 1;
                if attempt > max_retries {
                    Self::Terminal
                } else {
                    Self::Retrying { attempt }
                }
            }
            Self::Terminal => Self::Terminal,
        }
    }

    /// Transition once the backoff delay has elapsed
    pub fn after_backoff(self) -> Self {
        match self {
            Self::Retrying { attempt } => Self::Fetching { attempt },
            other => other,
        }
    }

    /// Transition after following a redirect; the retry budget is per hop
    pub fn after_redirect(self) -> Self {
        match self {
            Self::Terminal => Self::Terminal,
            _ => Self::Fetching { attempt: 0 },
        }
    }

    /// Delay to wait in this state, if any
    pub fn backoff(&self) -> Option<Duration> {
        match self {
            Self::Retrying { attempt } => Some(backoff_delay(*attempt)),
            _ => None,
        }
    }
}

/// Linear backoff: `attempt × 1000ms`
pub fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_STEP * attempt
}

impl fmt::Display for HopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching { attempt } => write!(f, "fetching (attempt {})", attempt),
            Self::Retrying { attempt } => write!(f, "retrying (attempt {})", attempt),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

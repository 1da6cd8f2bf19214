//! State module for tracking redirect-chain resolution
//!
//! # Components
//!
//! - `HopState`: Fetching → Retrying(attempt) → Terminal, the per-hop retry machine

mod hop_state;

// Re-export main types
pub use hop_state::{backoff_delay, HopState, BACKOFF_STEP};

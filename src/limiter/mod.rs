//! Request Rate Limiting
//!
//! Caps how many requests a single client may make within a time window,
//! ahead of any route handler.
//!
//! ## Submodules
//! - **`window`**: The admission policies (sliding log and fixed window), keyed per client.
//! - **`middleware`**: The axum layer that consults a policy and answers `429` on rejection.

pub mod middleware;
pub mod window;

use std::time::{Duration, Instant};

pub use middleware::{RateLimitLayerState, enforce_rate_limit};
pub use window::{FixedWindowLimiter, SlidingWindowLimiter};

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The request may proceed. `remaining` more requests fit in the current window.
    Admit { remaining: u32 },
    /// The client is over its budget until `retry_after` has elapsed.
    Reject { retry_after: Duration },
}

impl Verdict {
    #[cfg(test)]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Verdict::Admit { .. })
    }
}

/// Admission policy consulted once per request.
pub trait RateLimiter: Send + Sync + 'static {
    /// Records an attempt by `client` at `now` and decides whether to admit it.
    fn check(&self, client: &str, now: Instant) -> Verdict;

    /// Maximum requests per window, reported to clients in a header.
    fn limit(&self) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sliding,
    Fixed,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sliding" => Ok(Strategy::Sliding),
            "fixed" => Ok(Strategy::Fixed),
            other => Err(format!("unknown rate limit strategy '{}'", other)),
        }
    }
}

/// Builds the policy selected by configuration.
pub fn build(strategy: Strategy, max: u32, window: Duration) -> std::sync::Arc<dyn RateLimiter> {
    match strategy {
        Strategy::Sliding => std::sync::Arc::new(SlidingWindowLimiter::new(max, window)),
        Strategy::Fixed => std::sync::Arc::new(FixedWindowLimiter::new(max, window)),
    }
}

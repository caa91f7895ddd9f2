use super::{RateLimiter, Verdict};

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Tracked clients allowed before the first sweep of idle entries.
pub(crate) const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Per-client limiter state. Idle entries are swept only once the map has
/// outgrown `prune_at`, which is reset to twice the surviving size.
struct ClientTable<V> {
    entries: DashMap<String, V>,
    prune_at: AtomicUsize,
}

impl<V> ClientTable<V> {
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
            prune_at: AtomicUsize::new(MAX_TRACKED_CLIENTS),
        }
    }

    fn prune(&self, is_live: impl FnMut(&String, &mut V) -> bool) {
        let before = self.entries.len();
        if before <= self.prune_at.load(Ordering::Relaxed) {
            return;
        }
        self.entries.retain(is_live);
        let after = self.entries.len();
        self.prune_at
            .store(MAX_TRACKED_CLIENTS.max(after * 2), Ordering::Relaxed);
        tracing::debug!(before, after, "Pruned rate limiter state");
    }
}

/// Admits a request when fewer than `max` requests from the same client were
/// admitted during the trailing `window`.
pub struct SlidingWindowLimiter {
    max: u32,
    window: Duration,
    clients: ClientTable<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            clients: ClientTable::new(),
        }
    }

    #[cfg(test)]
    pub fn tracked_clients(&self) -> usize {
        self.clients.entries.len()
    }

    fn prune(&self, now: Instant) {
        let window = self.window;
        self.clients
            .prune(|_, log| log.back().is_some_and(|t| now.duration_since(*t) < window));
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn check(&self, client: &str, now: Instant) -> Verdict {
        self.prune(now);

        let mut log = self.clients.entries.entry(client.to_string()).or_default();
        while let Some(oldest) = log.front() {
            if now.duration_since(*oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }

        if (log.len() as u32) < self.max {
            log.push_back(now);
            return Verdict::Admit {
                remaining: self.max - log.len() as u32,
            };
        }

        let retry_after = log
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.window);
        Verdict::Reject { retry_after }
    }

    fn limit(&self) -> u32 {
        self.max
    }
}

struct FixedWindow {
    started: Instant,
    count: u32,
}

/// Counts requests per client in consecutive windows of length `window`,
/// the first one opening at the client's first request.
pub struct FixedWindowLimiter {
    max: u32,
    window: Duration,
    clients: ClientTable<FixedWindow>,
}

impl FixedWindowLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            clients: ClientTable::new(),
        }
    }

    #[cfg(test)]
    pub fn tracked_clients(&self) -> usize {
        self.clients.entries.len()
    }

    fn prune(&self, now: Instant) {
        let window = self.window;
        self.clients
            .prune(|_, state| now.duration_since(state.started) < window);
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, client: &str, now: Instant) -> Verdict {
        self.prune(now);

        let mut state = self
            .clients
            .entries
            .entry(client.to_string())
            .or_insert(FixedWindow {
                started: now,
                count: 0,
            });

        let elapsed = now.duration_since(state.started);
        if elapsed >= self.window {
            state.started = now;
            state.count = 0;
        }

        if state.count < self.max {
            state.count += 1;
            return Verdict::Admit {
                remaining: self.max - state.count,
            };
        }

        Verdict::Reject {
            retry_after: self
                .window
                .saturating_sub(now.duration_since(state.started)),
        }
    }

    fn limit(&self) -> u32 {
        self.max
    }
}

// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter keyed by client address.
//!
//! At most one request per client is admitted per window; the window is
//! anchored to the moment of last admission, not calendar-aligned. A
//! rejection never moves the window.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is admitted
    Allowed,
    /// Request is rate limited
    Limited {
        /// Time until the client's window reopens
        retry_after: Duration,
    },
}

/// Thread-safe fixed-window rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Per-client instant of last admission
    last_admitted: Arc<RwLock<HashMap<IpAddr, Instant>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            last_admitted: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check the rate limit for a client address.
    pub async fn check(&self, addr: IpAddr) -> RateLimitResult {
        self.check_at(addr, Instant::now()).await
    }

    /// Check the rate limit for a client address at an explicit instant.
    ///
    /// The read-check-write runs under a single write guard, so two
    /// in-flight requests from the same client cannot both observe a stale
    /// admission. The guard is never held across I/O.
    pub async fn check_at(&self, addr: IpAddr, now: Instant) -> RateLimitResult {
        let window = self.config.window_duration();
        let mut entries = self.last_admitted.write().await;

        if let Some(last) = entries.get(&addr) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < window {
                let retry_after = window - elapsed;
                debug!(client = %addr, ?retry_after, "rate limit exceeded");
                return RateLimitResult::Limited { retry_after };
            }
        }

        if entries.len() >= self.config.max_entries && !entries.contains_key(&addr) {
            purge_expired(&mut entries, now, window);
            if entries.len() >= self.config.max_entries {
                // Every tracked entry is still inside its window; admit
                // without tracking rather than evict live state.
                warn!(
                    entries = entries.len(),
                    "rate limit map at capacity, admitting untracked"
                );
                return RateLimitResult::Allowed;
            }
        }

        entries.insert(addr, now);
        RateLimitResult::Allowed
    }

    /// Evict entries whose window has fully elapsed (called periodically).
    pub async fn sweep(&self) {
        self.sweep_at(Instant::now()).await;
    }

    /// Sweep at an explicit instant.
    pub async fn sweep_at(&self, now: Instant) {
        let window = self.config.window_duration();
        let mut entries = self.last_admitted.write().await;
        purge_expired(&mut entries, now, window);
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.last_admitted.read().await.len()
    }
}

fn purge_expired(entries: &mut HashMap<IpAddr, Instant>, now: Instant, window: Duration) {
    let before = entries.len();
    entries.retain(|_, last| now.saturating_duration_since(*last) < window);
    let evicted = before - entries.len();
    if evicted > 0 {
        debug!(evicted, remaining = entries.len(), "purged expired rate limit entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn limiter_with_window(window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window_ms,
            ..Default::default()
        })
    }

    fn ip(last_octet: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet))
    }

    #[tokio::test]
    async fn test_second_request_within_window_rejected() {
        let limiter = limiter_with_window(1000);
        let t0 = Instant::now();

        let first = limiter.check_at(ip(1), t0).await;
        assert!(matches!(first, RateLimitResult::Allowed));

        let second = limiter.check_at(ip(1), t0 + Duration::from_millis(500)).await;
        match second {
            RateLimitResult::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_millis(500));
            }
            RateLimitResult::Allowed => panic!("should be limited"),
        }
    }

    #[tokio::test]
    async fn test_request_at_window_boundary_admitted() {
        let limiter = limiter_with_window(1000);
        let t0 = Instant::now();

        assert!(matches!(
            limiter.check_at(ip(1), t0).await,
            RateLimitResult::Allowed
        ));
        assert!(matches!(
            limiter.check_at(ip(1), t0 + Duration::from_millis(1000)).await,
            RateLimitResult::Allowed
        ));
    }

    #[tokio::test]
    async fn test_rejection_does_not_move_window() {
        let limiter = limiter_with_window(1000);
        let t0 = Instant::now();

        assert!(matches!(
            limiter.check_at(ip(1), t0).await,
            RateLimitResult::Allowed
        ));
        assert!(matches!(
            limiter.check_at(ip(1), t0 + Duration::from_millis(600)).await,
            RateLimitResult::Limited { .. }
        ));

        // 1100ms after the admission, inside the window a rejection at
        // 600ms would have opened had it reset the anchor.
        assert!(matches!(
            limiter.check_at(ip(1), t0 + Duration::from_millis(1100)).await,
            RateLimitResult::Allowed
        ));
    }

    #[tokio::test]
    async fn test_admission_resets_the_window_anchor() {
        let limiter = limiter_with_window(1000);
        let t0 = Instant::now();

        assert!(matches!(
            limiter.check_at(ip(1), t0).await,
            RateLimitResult::Allowed
        ));
        assert!(matches!(
            limiter.check_at(ip(1), t0 + Duration::from_millis(1500)).await,
            RateLimitResult::Allowed
        ));

        // 500ms into the second window
        let result = limiter.check_at(ip(1), t0 + Duration::from_millis(2000)).await;
        match result {
            RateLimitResult::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_millis(500));
            }
            RateLimitResult::Allowed => panic!("should be limited"),
        }
    }

    #[tokio::test]
    async fn test_clients_tracked_independently() {
        let limiter = limiter_with_window(1000);
        let t0 = Instant::now();

        assert!(matches!(
            limiter.check_at(ip(1), t0).await,
            RateLimitResult::Allowed
        ));
        assert!(matches!(
            limiter.check_at(ip(2), t0).await,
            RateLimitResult::Allowed
        ));
        assert!(matches!(
            limiter.check_at(ip(1), t0 + Duration::from_millis(100)).await,
            RateLimitResult::Limited { .. }
        ));
        assert!(matches!(
            limiter.check_at(ip(2), t0 + Duration::from_millis(1100)).await,
            RateLimitResult::Allowed
        ));
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_elapsed_entries() {
        let limiter = limiter_with_window(1000);
        let t0 = Instant::now();

        limiter.check_at(ip(1), t0).await;
        limiter.check_at(ip(2), t0 + Duration::from_millis(800)).await;
        assert_eq!(limiter.tracked_clients().await, 2);

        limiter.sweep_at(t0 + Duration::from_millis(1200)).await;
        assert_eq!(limiter.tracked_clients().await, 1);

        limiter.sweep_at(t0 + Duration::from_millis(2000)).await;
        assert_eq!(limiter.tracked_clients().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_purges_expired_entries_inline() {
        let limiter = RateLimiter::new(RateLimitConfig {
            window_ms: 1000,
            max_entries: 2,
            ..Default::default()
        });
        let t0 = Instant::now();

        limiter.check_at(ip(1), t0).await;
        limiter.check_at(ip(2), t0).await;
        assert_eq!(limiter.tracked_clients().await, 2);

        // Both prior entries expired; the new client must be tracked.
        let result = limiter.check_at(ip(3), t0 + Duration::from_millis(1500)).await;
        assert!(matches!(result, RateLimitResult::Allowed));
        assert_eq!(limiter.tracked_clients().await, 1);
    }
}

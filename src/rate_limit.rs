//! Per-client-address request budgets.
//!
//! Each address owns one fixed-window counter per [`Quota`]. A window opens
//! on the first request after the previous one expired; while it is open,
//! requests are counted until the quota's limit is reached. A request is
//! admitted only when every quota still has room, and an admitted request
//! is counted against all of them.
//!
//! The counter map is an explicitly owned value shared by cloning, so tests
//! and embedders can hand the router their own instance.

use dashmap::DashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::error::LookupError;

/// Expired counters are swept after this many checks.
const SWEEP_EVERY: u64 = 1024;

/// `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub window: Duration,
}

impl Quota {
    pub fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            window: Duration::from_secs(60),
        }
    }

    pub fn per_hour(limit: u32) -> Self {
        Self {
            limit,
            window: Duration::from_secs(3600),
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window.as_secs() {
            60 => write!(f, "{} per 1 minute", self.limit),
            3600 => write!(f, "{} per 1 hour", self.limit),
            secs => write!(f, "{} per {} seconds", self.limit, secs),
        }
    }
}

/// Returned when a quota is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub quota: Quota,
    /// Time until the exhausted window closes.
    pub retry_after: Duration,
}

impl From<RateLimitExceeded> for LookupError {
    fn from(e: RateLimitExceeded) -> Self {
        LookupError::RateLimited {
            limit: e.quota.to_string(),
            // Round up so clients never retry a moment too early.
            retry_after_secs: e.retry_after.as_secs() + u64::from(e.retry_after.subsec_nanos() > 0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    opened: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    quotas: Arc<[Quota]>,
    counters: Arc<DashMap<IpAddr, Vec<Window>>>,
    checks: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(quotas: Vec<Quota>) -> Self {
        Self {
            quotas: quotas.into(),
            counters: Arc::new(DashMap::new()),
            checks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Per-minute budget followed by the looser hourly ceiling.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(vec![
            Quota::per_minute(config.per_minute),
            Quota::per_hour(config.per_hour),
        ])
    }

    /// Counts one request from `addr`, or rejects it.
    pub fn check(&self, addr: IpAddr) -> Result<(), RateLimitExceeded> {
        self.check_at(addr, Instant::now())
    }

    /// [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, addr: IpAddr, now: Instant) -> Result<(), RateLimitExceeded> {
        let result = {
            let mut windows = self.counters.entry(addr).or_insert_with(|| {
                self.quotas
                    .iter()
                    .map(|_| Window {
                        count: 0,
                        opened: now,
                    })
                    .collect()
            });

            for (window, quota) in windows.iter_mut().zip(self.quotas.iter()) {
                if now.saturating_duration_since(window.opened) >= quota.window {
                    window.count = 0;
                    window.opened = now;
                }
            }

            let exhausted = windows
                .iter()
                .zip(self.quotas.iter())
                .find(|(window, quota)| window.count >= quota.limit);

            match exhausted {
                Some((window, quota)) => Err(RateLimitExceeded {
                    quota: *quota,
                    retry_after: quota
                        .window
                        .saturating_sub(now.saturating_duration_since(window.opened)),
                }),
                None => {
                    for window in windows.iter_mut() {
                        window.count += 1;
                    }
                    Ok(())
                }
            }
        };

        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep(now);
        }

        result
    }

    /// Drops addresses whose windows have all expired.
    pub fn sweep(&self, now: Instant) {
        let quotas = self.quotas.clone();
        self.counters.retain(|_, windows| {
            windows
                .iter()
                .zip(quotas.iter())
                .any(|(window, quota)| now.saturating_duration_since(window.opened) < quota.window)
        });
    }

    /// Number of addresses currently tracked.
    pub fn tracked(&self) -> usize {
        self.counters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(vec![Quota::per_minute(3)]);
        let t0 = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at(addr(1), t0).is_ok());
        }
        let err = limiter.check_at(addr(1), t0).unwrap_err();
        assert_eq!(err.quota, Quota::per_minute(3));
        assert_eq!(err.retry_after, Duration::from_secs(60));
    }

    #[test]
    fn test_addresses_are_independent() {
        let limiter = RateLimiter::new(vec![Quota::per_minute(1)]);
        let t0 = Instant::now();
        assert!(limiter.check_at(addr(1), t0).is_ok());
        assert!(limiter.check_at(addr(1), t0).is_err());
        assert!(limiter.check_at(addr(2), t0).is_ok());
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = RateLimiter::new(vec![Quota::per_minute(1)]);
        let t0 = Instant::now();
        assert!(limiter.check_at(addr(1), t0).is_ok());

        let err = limiter
            .check_at(addr(1), t0 + Duration::from_secs(45))
            .unwrap_err();
        assert_eq!(err.retry_after, Duration::from_secs(15));

        assert!(limiter.check_at(addr(1), t0 + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_hourly_ceiling_applies_across_minutes() {
        let limiter = RateLimiter::new(vec![Quota::per_minute(2), Quota::per_hour(3)]);
        let t0 = Instant::now();
        assert!(limiter.check_at(addr(1), t0).is_ok());
        assert!(limiter.check_at(addr(1), t0).is_ok());
        assert!(limiter.check_at(addr(1), t0).is_err());

        let later = t0 + Duration::from_secs(61);
        assert!(limiter.check_at(addr(1), later).is_ok());
        let err = limiter.check_at(addr(1), later).unwrap_err();
        assert_eq!(err.quota, Quota::per_hour(3));
    }

    #[test]
    fn test_rejected_requests_are_not_counted() {
        let limiter = RateLimiter::new(vec![Quota::per_minute(1), Quota::per_hour(2)]);
        let t0 = Instant::now();
        assert!(limiter.check_at(addr(1), t0).is_ok());
        for _ in 0..5 {
            assert!(limiter.check_at(addr(1), t0).is_err());
        }
        // The hourly window saw only the admitted request.
        assert!(limiter
            .check_at(addr(1), t0 + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn test_sweep_drops_expired_addresses() {
        let limiter = RateLimiter::new(vec![Quota::per_minute(5)]);
        let t0 = Instant::now();
        limiter.check_at(addr(1), t0).unwrap();
        limiter.check_at(addr(2), t0 + Duration::from_secs(30)).unwrap();
        assert_eq!(limiter.tracked(), 2);

        limiter.sweep(t0 + Duration::from_secs(61));
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_quota_display() {
        assert_eq!(Quota::per_minute(20).to_string(), "20 per 1 minute");
        assert_eq!(Quota::per_hour(100).to_string(), "100 per 1 hour");
    }

    #[test]
    fn test_into_lookup_error_rounds_up() {
        let err: LookupError = RateLimitExceeded {
            quota: Quota::per_minute(20),
            retry_after: Duration::from_millis(1500),
        }
        .into();
        match err {
            LookupError::RateLimited {
                limit,
                retry_after_secs,
            } => {
                assert_eq!(limit, "20 per 1 minute");
                assert_eq!(retry_after_secs, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

//! Per-IP login rate limiting.
//!
//! Failed attempts accumulate per client IP. Once the configured maximum is
//! reached, further logins from that IP are refused until the lockout window
//! (measured from the FIRST failure) has elapsed, at which point the record
//! is dropped and the next attempt starts fresh. A successful login clears
//! the record immediately.
//!
//! Expiry is lazy: records are only examined and removed when the same IP
//! comes back, so there is no background sweeper task.

use dashmap::DashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::types::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub count: u32,
    pub first_attempt: Instant,
    pub last_attempt: Instant,
}

pub struct LoginRateLimiter {
    attempts: DashMap<IpAddr, AttemptRecord>,
    max_attempts: u32,
    lockout: Duration,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts,
            lockout,
        }
    }

    /// Check whether `ip` may attempt a login right now.
    ///
    /// Returns `RateLimited` with a retry-after hint while the IP is locked
    /// out. Records whose window has elapsed are removed here rather than
    /// decremented.
    pub fn check(&self, ip: IpAddr) -> Result<()> {
        let mut stale = false;

        if let Some(record) = self.attempts.get(&ip) {
            let elapsed = record.first_attempt.elapsed();
            if elapsed >= self.lockout {
                stale = true;
            } else if record.count >= self.max_attempts {
                let retry_after_secs = (self.lockout - elapsed).as_secs().max(1);
                return Err(ApiError::RateLimited { retry_after_secs });
            }
        }

        if stale {
            self.attempts.remove(&ip);
        }

        Ok(())
    }

    /// Record a failed login for `ip`, returning the updated failure count.
    ///
    /// The entry API serializes concurrent updates for the same IP, so no
    /// failure is lost under parallel login attempts.
    pub fn record_failure(&self, ip: IpAddr) -> u32 {
        let now = Instant::now();
        let mut entry = self.attempts.entry(ip).or_insert_with(|| AttemptRecord {
            count: 0,
            first_attempt: now,
            last_attempt: now,
        });
        entry.count += 1;
        entry.last_attempt = now;
        entry.count
    }

    /// Clear the failure record for `ip` (successful login).
    pub fn clear(&self, ip: IpAddr) {
        self.attempts.remove(&ip);
    }

    /// Drop all failure records (security reset).
    pub fn clear_all(&self) {
        self.attempts.clear();
    }

    /// Number of IPs currently being tracked.
    pub fn tracked_ips(&self) -> usize {
        self.attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    fn limiter() -> LoginRateLimiter {
        LoginRateLimiter::new(5, Duration::from_secs(3600))
    }

    #[test]
    fn test_allows_below_threshold() {
        let rl = limiter();
        for _ in 0..4 {
            assert!(rl.check(ip(1)).is_ok());
            rl.record_failure(ip(1));
        }
        assert!(rl.check(ip(1)).is_ok());
    }

    #[test]
    fn test_locks_out_at_threshold() {
        let rl = limiter();
        for _ in 0..5 {
            rl.record_failure(ip(1));
        }

        match rl.check(ip(1)) {
            Err(ApiError::RateLimited { retry_after_secs }) => {
                assert!(retry_after_secs > 0 && retry_after_secs <= 3600);
            }
            other => panic!("expected RateLimited, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_ips_are_independent() {
        let rl = limiter();
        for _ in 0..5 {
            rl.record_failure(ip(1));
        }

        assert!(rl.check(ip(1)).is_err());
        assert!(rl.check(ip(2)).is_ok());
    }

    #[test]
    fn test_success_clears_count() {
        let rl = limiter();
        for _ in 0..4 {
            rl.record_failure(ip(1));
        }
        rl.clear(ip(1));

        assert_eq!(rl.record_failure(ip(1)), 1);
        assert!(rl.check(ip(1)).is_ok());
    }

    #[test]
    fn test_window_expiry_starts_fresh() {
        let rl = LoginRateLimiter::new(3, Duration::from_millis(50));
        for _ in 0..3 {
            rl.record_failure(ip(1));
        }
        assert!(rl.check(ip(1)).is_err());

        std::thread::sleep(Duration::from_millis(60));

        // Window elapsed: record dropped, not decremented.
        assert!(rl.check(ip(1)).is_ok());
        assert_eq!(rl.record_failure(ip(1)), 1);
    }

    #[test]
    fn test_stale_record_below_threshold_also_dropped() {
        let rl = LoginRateLimiter::new(5, Duration::from_millis(50));
        rl.record_failure(ip(1));
        rl.record_failure(ip(1));

        std::thread::sleep(Duration::from_millis(60));

        assert!(rl.check(ip(1)).is_ok());
        assert_eq!(rl.record_failure(ip(1)), 1);
    }

    #[test]
    fn test_concurrent_failures_all_counted() {
        let rl = std::sync::Arc::new(LoginRateLimiter::new(1000, Duration::from_secs(3600)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let rl = rl.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        rl.record_failure(ip(1));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let final_count = rl.record_failure(ip(1));
        assert_eq!(final_count, 201);
    }

    #[test]
    fn test_clear_all() {
        let rl = limiter();
        for _ in 0..5 {
            rl.record_failure(ip(1));
            rl.record_failure(ip(2));
        }
        assert_eq!(rl.tracked_ips(), 2);

        rl.clear_all();
        assert_eq!(rl.tracked_ips(), 0);
        assert!(rl.check(ip(1)).is_ok());
    }
}

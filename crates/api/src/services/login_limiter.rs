//! Per-IP lockout for failed logins.
//!
//! A client IP that fails [`MAX_ATTEMPTS`] logins is locked out until
//! [`LOCKOUT_WINDOW`] has passed since its last failure. A successful login
//! clears the entry. State lives in this process only.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Failures allowed before the lockout applies.
pub const MAX_ATTEMPTS: u32 = 5;

/// How long an IP stays locked after its last failure.
pub const LOCKOUT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Message returned with HTTP 429.
pub const LOCKOUT_MESSAGE: &str = "Too many login attempts. Please try again in 15 minutes.";

#[derive(Debug, Clone, Copy)]
struct Attempts {
    count: u32,
    last_attempt: Instant,
}

impl Attempts {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_attempt) >= LOCKOUT_WINDOW
    }
}

/// The caller is locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedOut {
    /// Time until the window elapses.
    pub retry_after: Duration,
}

/// In-memory map from client IP to failed login attempts.
#[derive(Debug, Default)]
pub struct LoginLimiter {
    attempts: DashMap<String, Attempts>,
}

impl LoginLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `ip` may attempt a login at `now`.
    ///
    /// An entry whose window has elapsed is removed, resetting the count.
    ///
    /// # Errors
    ///
    /// Returns `LockedOut` once the IP has [`MAX_ATTEMPTS`] failures inside
    /// the window.
    pub fn check(&self, ip: &str, now: Instant) -> Result<(), LockedOut> {
        let Some(entry) = self.attempts.get(ip).map(|e| *e) else {
            return Ok(());
        };

        if entry.expired(now) {
            self.attempts.remove_if(ip, |_, current| current.expired(now));
            return Ok(());
        }

        if entry.count >= MAX_ATTEMPTS {
            let elapsed = now.saturating_duration_since(entry.last_attempt);
            return Err(LockedOut {
                retry_after: LOCKOUT_WINDOW.saturating_sub(elapsed),
            });
        }
        Ok(())
    }

    /// Count a failed login from `ip`, returning the updated count.
    pub fn record_failure(&self, ip: &str, now: Instant) -> u32 {
        let mut entry = self.attempts.entry(ip.to_owned()).or_insert(Attempts {
            count: 0,
            last_attempt: now,
        });
        if entry.expired(now) {
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);
        entry.last_attempt = now;
        entry.count
    }

    /// Forget `ip` after a successful login.
    pub fn record_success(&self, ip: &str) {
        self.attempts.remove(ip);
    }

    /// Drop entries whose window has elapsed, returning how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let before = self.attempts.len();
        self.attempts.retain(|_, attempts| !attempts.expired(now));
        before.saturating_sub(self.attempts.len())
    }

    /// Number of tracked IPs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const IP: &str = "203.0.113.7";

    fn fail_times(limiter: &LoginLimiter, n: u32, now: Instant) {
        for _ in 0..n {
            limiter.record_failure(IP, now);
        }
    }

    #[test]
    fn test_allows_until_max_attempts() {
        let limiter = LoginLimiter::new();
        let now = Instant::now();

        for attempt in 1..MAX_ATTEMPTS {
            limiter.record_failure(IP, now);
            assert!(limiter.check(IP, now).is_ok(), "attempt {attempt}");
        }
        limiter.record_failure(IP, now);
        assert!(limiter.check(IP, now).is_err());
    }

    #[test]
    fn test_sixth_attempt_inside_window_is_rejected() {
        let limiter = LoginLimiter::new();
        let start = Instant::now();
        fail_times(&limiter, 5, start);

        let later = start + Duration::from_secs(14 * 60);
        let locked = limiter.check(IP, later).unwrap_err();
        assert_eq!(locked.retry_after, Duration::from_secs(60));
    }

    #[test]
    fn test_window_elapsed_resets() {
        let limiter = LoginLimiter::new();
        let start = Instant::now();
        fail_times(&limiter, 5, start);

        let later = start + LOCKOUT_WINDOW;
        assert!(limiter.check(IP, later).is_ok());
        assert!(limiter.is_empty());
        assert_eq!(limiter.record_failure(IP, later), 1);
    }

    #[test]
    fn test_stale_failure_restarts_count() {
        let limiter = LoginLimiter::new();
        let start = Instant::now();
        fail_times(&limiter, 4, start);
        assert_eq!(limiter.record_failure(IP, start + LOCKOUT_WINDOW), 1);
    }

    #[test]
    fn test_success_clears_entry() {
        let limiter = LoginLimiter::new();
        let now = Instant::now();
        fail_times(&limiter, 5, now);
        limiter.record_success(IP);
        assert!(limiter.check(IP, now).is_ok());
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_ips_are_independent() {
        let limiter = LoginLimiter::new();
        let now = Instant::now();
        fail_times(&limiter, 5, now);
        assert!(limiter.check("198.51.100.1", now).is_ok());
    }

    #[test]
    fn test_prune_removes_only_expired() {
        let limiter = LoginLimiter::new();
        let start = Instant::now();
        limiter.record_failure("198.51.100.1", start);
        limiter.record_failure(IP, start + Duration::from_secs(600));

        assert_eq!(limiter.prune(start + LOCKOUT_WINDOW), 1);
        assert_eq!(limiter.len(), 1);
    }
}

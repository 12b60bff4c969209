//! Fixed-window request limiter guarding the snapshot source.

use chrono::{DateTime, Duration, Utc};
use fuel_core::error::{FuelError, Result};

/// Default request budget per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 50;

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Allows at most `max_requests` calls per `window`; the counter resets on the
/// first call made more than `window` after the window opened.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    window_start: Option<DateTime<Utc>>,
    count: u32,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::seconds(window_secs as i64),
            window_start: None,
            count: 0,
        }
    }

    /// Record one request at `now`, or fail with [`FuelError::RateLimited`]
    /// when the current window is exhausted. Rejected calls are not counted.
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<()> {
        let expired = self
            .window_start
            .map_or(true, |start| now - start > self.window || now < start);
        if expired {
            self.window_start = Some(now);
            self.count = 0;
        }

        if self.count >= self.max_requests {
            return Err(FuelError::RateLimited {
                max_requests: self.max_requests,
                window_secs: self.window.num_seconds() as u64,
            });
        }
        self.count += 1;
        Ok(())
    }

    /// Requests still allowed in the window that contains `now`.
    pub fn remaining(&self, now: DateTime<Utc>) -> u32 {
        match self.window_start {
            Some(start) if now >= start && now - start <= self.window => {
                self.max_requests.saturating_sub(self.count)
            }
            _ => self.max_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_allows_up_to_budget() {
        let mut limiter = RateLimiter::new(3, 60);
        for i in 0..3 {
            assert!(limiter.check(t(i)).is_ok());
        }
        let err = limiter.check(t(10)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded: at most 3 requests per 60s"
        );
        assert_eq!(limiter.remaining(t(10)), 0);
    }

    #[test]
    fn test_window_resets() {
        let mut limiter = RateLimiter::new(1, 60);
        assert!(limiter.check(t(0)).is_ok());
        assert!(limiter.check(t(60)).is_err());
        assert!(limiter.check(t(61)).is_ok());
        assert_eq!(limiter.remaining(t(62)), 0);
        assert_eq!(limiter.remaining(t(200)), 1);
    }

    #[test]
    fn test_defaults() {
        let mut limiter = RateLimiter::default();
        assert_eq!(limiter.remaining(t(0)), 50);
        for _ in 0..50 {
            limiter.check(t(1)).unwrap();
        }
        assert!(matches!(
            limiter.check(t(2)),
            Err(FuelError::RateLimited {
                max_requests: 50,
                window_secs: 60
            })
        ));
    }

    #[test]
    fn test_clock_going_backwards_starts_new_window() {
        let mut limiter = RateLimiter::new(1, 60);
        assert!(limiter.check(t(100)).is_ok());
        assert!(limiter.check(t(50)).is_ok());
    }
}

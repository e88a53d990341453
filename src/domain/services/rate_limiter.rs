//! Fixed-window request counting keyed by caller and route.
//!
//! State lives in process memory only: it is not shared between instances
//! and is lost on restart.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::RateLimit;
use crate::error::AppError;

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Default)]
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, key: &str, limit: &RateLimit) -> Result<(), AppError> {
        self.check_at(key, limit, Instant::now())
    }

    pub fn check_at(&self, key: &str, limit: &RateLimit, now: Instant) -> Result<(), AppError> {
        let window_len = Duration::from_secs(limit.window_secs);
        let mut windows = self.windows.lock().map_err(|_| AppError::Internal)?;

        let window = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }

        if window.count >= limit.max_requests {
            let elapsed = now.duration_since(window.started);
            let retry_after = window_len.saturating_sub(elapsed).as_secs().max(1);
            debug!(key, retry_after, "Rate limit exceeded");
            return Err(AppError::RateLimited(retry_after));
        }

        window.count += 1;
        Ok(())
    }

    /// Drops windows that ended at least `max_window` ago.
    pub fn purge_expired(&self, max_window: Duration) -> usize {
        self.purge_expired_at(max_window, Instant::now())
    }

    fn purge_expired_at(&self, max_window: Duration, now: Instant) -> usize {
        let Ok(mut windows) = self.windows.lock() else {
            return 0;
        };
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < max_window);
        before - windows.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(max_requests: u32, window_secs: u64) -> RateLimit {
        RateLimit { max_requests, window_secs }
    }

    #[test]
    fn test_allows_exactly_n_per_window() {
        let limiter = FixedWindowLimiter::new();
        let l = limit(3, 60);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("1.2.3.4:login", &l, start).is_ok());
        }
        let rejected = limiter.check_at("1.2.3.4:login", &l, start + Duration::from_secs(10));
        assert!(matches!(rejected, Err(AppError::RateLimited(50))));
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = FixedWindowLimiter::new();
        let l = limit(1, 60);
        let start = Instant::now();

        assert!(limiter.check_at("k", &l, start).is_ok());
        assert!(limiter.check_at("k", &l, start + Duration::from_secs(59)).is_err());
        assert!(limiter.check_at("k", &l, start + Duration::from_secs(60)).is_ok());
        assert!(limiter.check_at("k", &l, start + Duration::from_secs(61)).is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = FixedWindowLimiter::new();
        let l = limit(1, 60);
        let now = Instant::now();

        assert!(limiter.check_at("a:login", &l, now).is_ok());
        assert!(limiter.check_at("b:login", &l, now).is_ok());
        assert!(limiter.check_at("a:verify", &l, now).is_ok());
        assert!(limiter.check_at("a:login", &l, now).is_err());
    }

    #[test]
    fn test_purge_expired() {
        let limiter = FixedWindowLimiter::new();
        let l = limit(5, 60);
        let start = Instant::now();

        limiter.check_at("old", &l, start).unwrap();
        limiter.check_at("new", &l, start + Duration::from_secs(100)).unwrap();

        let removed = limiter.purge_expired_at(Duration::from_secs(60), start + Duration::from_secs(120));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }
}

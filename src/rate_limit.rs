use std::time::{Duration, Instant};

use dashmap::DashMap;

pub const MAX_FAILURES: u32 = 5;
pub const WINDOW: Duration = Duration::from_secs(15 * 60);

pub const RECOVERY_REQUESTS_PER_CLIENT: u32 = 20;
pub const RECOVERY_WINDOW: Duration = Duration::from_secs(15 * 60);
pub const RESET_MAILS_PER_ADDRESS: u32 = 3;
pub const RESET_MAIL_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Per-email login brute force limiter.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if login attempt is allowed. Returns the seconds left in the window when blocked.
    /// Does NOT increment the counter; call `record_failure()` on invalid password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(&normalize(email)) else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > WINDOW {
            return Ok(());
        }

        if *count >= MAX_FAILURES {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(normalize(email)).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn reset(&self, email: &str) {
        self.entries.remove(&normalize(email));
    }

    /// Drop windows that have fully elapsed.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < WINDOW);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fixed-window request counter per key, for endpoints that must stay cheap to abuse.
pub struct RequestRateLimiter {
    max: u32,
    window: Duration,
    /// key -> (requests, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl RequestRateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            entries: DashMap::new(),
        }
    }

    /// Count one request for `key`. Once the window is full, returns the seconds
    /// until it resets and does not count the request.
    pub fn hit(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 0;
            *start = now;
        }

        if *count >= self.max {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < window);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..MAX_FAILURES - 1 {
            limiter.record_failure("a@test.com");
        }
        assert!(limiter.check("a@test.com").is_ok());

        limiter.record_failure("A@Test.com");
        let retry_after = limiter.check("a@test.com").unwrap_err();
        assert!(retry_after > 0 && retry_after <= WINDOW.as_secs());
        assert!(limiter.check("b@test.com").is_ok());
    }

    #[test]
    fn reset_clears_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..MAX_FAILURES {
            limiter.record_failure("a@test.com");
        }
        limiter.reset("a@test.com");
        assert!(limiter.check("a@test.com").is_ok());
        assert!(limiter.is_empty());
    }

    #[test]
    fn surrounding_whitespace_shares_a_window() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..MAX_FAILURES {
            limiter.record_failure(" a@test.com");
        }
        assert!(limiter.check("a@test.com  ").is_err());
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn request_limiter_caps_each_key() {
        let limiter = RequestRateLimiter::new(3, WINDOW);
        for _ in 0..3 {
            assert!(limiter.hit("10.0.0.1").is_ok());
        }
        assert!(limiter.hit("10.0.0.1").is_err());
        assert!(limiter.hit("10.0.0.2").is_ok());

        limiter.cleanup();
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn request_limiter_window_expires() {
        let limiter = RequestRateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.hit("k").is_ok());
        assert!(limiter.hit("k").is_err());
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.hit("k").is_ok());
    }

    #[test]
    fn cleanup_keeps_live_windows() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failure("a@test.com");
        limiter.cleanup();
        assert_eq!(limiter.len(), 1);
    }
}

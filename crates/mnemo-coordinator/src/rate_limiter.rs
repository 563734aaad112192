//! Token bucket rate limiter.
//!
//! Refills continuously at `rate` tokens per second with a burst capacity
//! equal to the rate. Admission never waits: an empty bucket rejects.

use tokio::time::Instant;

/// A token bucket rate limiter.
#[derive(Debug)]
pub struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    capacity: f64,
    rate: f64,
}

impl TokenBucket {
    /// Create a full bucket refilling at `rate` tokens per second.
    ///
    /// Capacity is at least one token so that fractional rates still admit.
    pub fn new(rate: f64) -> Self {
        Self::new_at(rate, Instant::now())
    }

    pub fn new_at(rate: f64, now: Instant) -> Self {
        let capacity = rate.max(1.0);
        Self {
            tokens: capacity,
            last_refill: now,
            capacity,
            rate,
        }
    }

    /// Try to acquire one token. Returns `true` if allowed, `false` if rate limited.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently available, after refilling up to `now`.
    pub fn available_at(&mut self, now: Instant) -> f64 {
        self.refill(now);
        self.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = self.last_refill.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_up_to_capacity() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(5.0, start);

        for _ in 0..5 {
            assert!(bucket.try_acquire_at(start));
        }
        assert!(!bucket.try_acquire_at(start));
    }

    #[test]
    fn test_refills_over_time() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(10.0, start);
        for _ in 0..10 {
            bucket.try_acquire_at(start);
        }
        assert!(!bucket.try_acquire_at(start));

        // 10 tokens/s -> one token every 100ms
        let later = start + Duration::from_millis(100);
        assert!(bucket.try_acquire_at(later));
        assert!(!bucket.try_acquire_at(later));
    }

    #[test]
    fn test_refill_capped_at_capacity() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(3.0, start);
        bucket.try_acquire_at(start);

        let much_later = start + Duration::from_secs(60);
        assert!((bucket.available_at(much_later) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fractional_rate_admits_one() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(0.5, start);
        assert!((bucket.capacity() - 1.0).abs() < f64::EPSILON);
        assert!(bucket.try_acquire_at(start));
        assert!(!bucket.try_acquire_at(start + Duration::from_secs(1)));
        assert!(bucket.try_acquire_at(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut bucket = TokenBucket::new_at(1.0, start);
        assert!(bucket.try_acquire_at(start));
        assert!(!bucket.try_acquire_at(start - Duration::from_millis(500)));
    }
}

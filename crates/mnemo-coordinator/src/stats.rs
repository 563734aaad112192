//! Coordinator statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mnemo_protocols::CoordinatorError;
use serde::Serialize;

use crate::circuit_breaker::CircuitState;

/// Point-in-time snapshot of coordinator activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorStats {
    /// Requests that completed successfully.
    pub requests_processed: u64,
    /// Requests that ended with any error, including admission rejections.
    pub requests_failed: u64,
    /// Mean admission-to-reply time of successful requests.
    pub avg_processing_time_ms: f64,
    pub circuit_state: CircuitState,
    /// Breaker not open and coordinator not shutting down.
    pub backend_available: bool,
    /// Backend `embed_batch` calls.
    pub batch_calls: u64,
    /// Backend `embed` calls.
    pub individual_calls: u64,
    pub rate_limited: u64,
    pub circuit_rejections: u64,
    pub timeouts: u64,
    /// Requests admitted but not yet dispatched.
    pub queue_depth: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    processed: AtomicU64,
    failed: AtomicU64,
    processing_micros: AtomicU64,
    batch_calls: AtomicU64,
    individual_calls: AtomicU64,
    rate_limited: AtomicU64,
    circuit_rejections: AtomicU64,
    timeouts: AtomicU64,
}

impl StatsRecorder {
    pub fn record_outcome<T>(&self, result: &Result<T, CoordinatorError>, elapsed: Duration) {
        match result {
            Ok(_) => {
                self.processed.fetch_add(1, Ordering::Relaxed);
                let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
                self.processing_micros.fetch_add(micros, Ordering::Relaxed);
            }
            Err(err) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                let counter = match err {
                    CoordinatorError::RateLimitExceeded => Some(&self.rate_limited),
                    CoordinatorError::CircuitOpen => Some(&self.circuit_rejections),
                    CoordinatorError::Timeout(_) => Some(&self.timeouts),
                    CoordinatorError::Backend(_) | CoordinatorError::Shutdown => None,
                };
                if let Some(counter) = counter {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn record_backend_call(&self, individual: bool) {
        if individual {
            self.individual_calls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.batch_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(
        &self,
        circuit_state: CircuitState,
        backend_available: bool,
        queue_depth: usize,
    ) -> CoordinatorStats {
        let processed = self.processed.load(Ordering::Relaxed);
        let micros = self.processing_micros.load(Ordering::Relaxed);
        let avg_processing_time_ms = if processed == 0 {
            0.0
        } else {
            micros as f64 / processed as f64 / 1000.0
        };

        CoordinatorStats {
            requests_processed: processed,
            requests_failed: self.failed.load(Ordering::Relaxed),
            avg_processing_time_ms,
            circuit_state,
            backend_available,
            batch_calls: self.batch_calls.load(Ordering::Relaxed),
            individual_calls: self.individual_calls.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            circuit_rejections: self.circuit_rejections.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            queue_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_over_successes() {
        let recorder = StatsRecorder::default();
        recorder.record_outcome(&Ok::<(), _>(()), Duration::from_millis(10));
        recorder.record_outcome(&Ok::<(), _>(()), Duration::from_millis(30));
        recorder.record_outcome(
            &Err::<(), _>(CoordinatorError::Backend("x".into())),
            Duration::from_secs(5),
        );

        let stats = recorder.snapshot(CircuitState::Closed, true, 0);
        assert_eq!(stats.requests_processed, 2);
        assert_eq!(stats.requests_failed, 1);
        assert!((stats.avg_processing_time_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_counters() {
        let recorder = StatsRecorder::default();
        for err in [
            CoordinatorError::RateLimitExceeded,
            CoordinatorError::CircuitOpen,
            CoordinatorError::Timeout(Duration::from_millis(1)),
            CoordinatorError::Shutdown,
        ] {
            recorder.record_outcome(&Err::<(), _>(err), Duration::ZERO);
        }
        recorder.record_backend_call(true);
        recorder.record_backend_call(false);
        recorder.record_backend_call(false);

        let stats = recorder.snapshot(CircuitState::Open, false, 3);
        assert_eq!(stats.requests_failed, 4);
        assert_eq!(stats.rate_limited, 1);
        assert_eq!(stats.circuit_rejections, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.individual_calls, 1);
        assert_eq!(stats.batch_calls, 2);
        assert_eq!(stats.queue_depth, 3);
        assert_eq!(stats.avg_processing_time_ms, 0.0);
    }

    #[test]
    fn test_stats_serialization() {
        let stats = StatsRecorder::default().snapshot(CircuitState::Closed, true, 0);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["circuit_state"], "closed");
        assert_eq!(json["backend_available"], true);
        assert_eq!(json["requests_processed"], 0);
    }
}

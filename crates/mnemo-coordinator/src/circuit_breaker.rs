//! Circuit breaker guarding the embedding backend.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Requests pass through.
    Closed,
    /// Requests are rejected until the timeout elapses.
    Open,
    /// A single trial request decides whether to close again.
    HalfOpen,
}

/// Outcome of asking the breaker to admit a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The request is the half-open trial; its outcome decides the next state.
    Trial,
    Rejected,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: CircuitState,
    consecutive_failures: u32,
    failure_threshold: u32,
    timeout: Duration,
    opened_at: Option<Instant>,
    trial_outstanding: bool,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            failure_threshold: failure_threshold.max(1),
            timeout,
            opened_at: None,
            trial_outstanding: false,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Decide whether a new request may enter.
    ///
    /// An open breaker whose timeout has elapsed moves to half-open and hands
    /// out the trial slot to this caller.
    pub fn admit(&mut self, now: Instant) -> Admission {
        match self.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                let elapsed = self
                    .opened_at
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or_default();
                if elapsed >= self.timeout {
                    info!("Circuit half-open after {:?}, allowing a trial request", elapsed);
                    self.state = CircuitState::HalfOpen;
                    self.trial_outstanding = true;
                    Admission::Trial
                } else {
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen if self.trial_outstanding => Admission::Rejected,
            CircuitState::HalfOpen => {
                self.trial_outstanding = true;
                Admission::Trial
            }
        }
    }

    /// Whether queued work may reach the backend now.
    pub fn can_dispatch(&self, is_trial: bool) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => is_trial,
        }
    }

    /// Give the trial slot back without an outcome.
    pub fn release_trial(&mut self) {
        if self.state == CircuitState::HalfOpen {
            self.trial_outstanding = false;
        }
    }

    /// Record a successful backend call. `trial` is true when the call held
    /// the half-open trial slot; only that call may close the breaker.
    pub fn record_success(&mut self, trial: bool) {
        match self.state {
            CircuitState::Closed => self.consecutive_failures = 0,
            CircuitState::HalfOpen if trial => {
                info!("Circuit closed after successful trial request");
                self.state = CircuitState::Closed;
                self.consecutive_failures = 0;
                self.opened_at = None;
                self.trial_outstanding = false;
            }
            // Calls dispatched before the breaker opened; the open timer stands.
            CircuitState::HalfOpen | CircuitState::Open => {}
        }
    }

    /// Record a failed backend call. Outside the closed state only the
    /// trial's outcome counts.
    pub fn record_failure(&mut self, now: Instant, trial: bool) {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= self.failure_threshold {
                    warn!(
                        "Circuit opened after {} consecutive backend failures",
                        self.consecutive_failures
                    );
                    self.open(now);
                }
            }
            CircuitState::HalfOpen if trial => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!("Trial request failed, circuit re-opened");
                self.open(now);
            }
            CircuitState::HalfOpen | CircuitState::Open => {}
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.trial_outstanding = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn tripped(now: Instant) -> CircuitBreaker {
        let mut breaker = CircuitBreaker::new(3, TIMEOUT);
        for _ in 0..3 {
            breaker.record_failure(now, false);
        }
        breaker
    }

    #[test]
    fn test_opens_at_threshold() {
        let now = Instant::now();
        let mut breaker = CircuitBreaker::new(3, TIMEOUT);

        breaker.record_failure(now, false);
        breaker.record_failure(now, false);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.admit(now), Admission::Allowed);

        breaker.record_failure(now, false);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.admit(now), Admission::Rejected);
        assert!(!breaker.can_dispatch(false));
    }

    #[test]
    fn test_success_resets_counter() {
        let now = Instant::now();
        let mut breaker = CircuitBreaker::new(3, TIMEOUT);
        breaker.record_failure(now, false);
        breaker.record_failure(now, false);
        breaker.record_success(false);
        assert_eq!(breaker.consecutive_failures(), 0);

        breaker.record_failure(now, false);
        breaker.record_failure(now, false);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_single_trial() {
        let now = Instant::now();
        let mut breaker = tripped(now);

        let later = now + TIMEOUT;
        assert_eq!(breaker.admit(later), Admission::Trial);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.admit(later), Admission::Rejected);

        assert!(breaker.can_dispatch(true));
        assert!(!breaker.can_dispatch(false));
    }

    #[test]
    fn test_trial_success_closes() {
        let now = Instant::now();
        let mut breaker = tripped(now);
        breaker.admit(now + TIMEOUT);

        breaker.record_success(true);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
        assert_eq!(breaker.admit(now + TIMEOUT), Admission::Allowed);
    }

    #[test]
    fn test_trial_failure_reopens_and_restarts_timer() {
        let now = Instant::now();
        let mut breaker = tripped(now);
        let trial_at = now + TIMEOUT;
        breaker.admit(trial_at);

        breaker.record_failure(trial_at, true);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.admit(trial_at + TIMEOUT / 2), Admission::Rejected);
        assert_eq!(breaker.admit(trial_at + TIMEOUT), Admission::Trial);
    }

    #[test]
    fn test_release_trial() {
        let now = Instant::now();
        let mut breaker = tripped(now);
        let later = now + TIMEOUT;
        assert_eq!(breaker.admit(later), Admission::Trial);

        breaker.release_trial();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.admit(later), Admission::Trial);
    }

    #[test]
    fn test_late_success_does_not_close_open_breaker() {
        let now = Instant::now();
        let mut breaker = tripped(now);
        breaker.record_success(false);
        breaker.record_failure(now, false);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.consecutive_failures(), 3);
    }

    #[test]
    fn test_stale_success_ignored_while_half_open() {
        let now = Instant::now();
        let mut breaker = tripped(now);
        let later = now + TIMEOUT;
        assert_eq!(breaker.admit(later), Admission::Trial);

        // A call dispatched while closed finishes during the trial.
        breaker.record_success(false);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.admit(later), Admission::Rejected);

        breaker.record_success(true);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_stale_failure_ignored_while_half_open() {
        let now = Instant::now();
        let mut breaker = tripped(now);
        let later = now + TIMEOUT;
        assert_eq!(breaker.admit(later), Admission::Trial);

        breaker.record_failure(later, false);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.can_dispatch(true));

        breaker.record_failure(later, true);
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&CircuitState::HalfOpen).unwrap();
        assert_eq!(json, "\"half_open\"");
    }
}

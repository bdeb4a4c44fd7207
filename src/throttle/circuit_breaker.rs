//! Circuit breaker for upstream failure isolation.
//!
//! When the upstream fails repeatedly, continuing to send requests wastes
//! cost budget and adds load to a service that is already struggling. The
//! breaker fails such calls fast instead, then probes for recovery after a
//! cooldown.
//!
//! # States
//!
//! - `Closed`: normal operation, requests pass through
//! - `Open`: upstream assumed down, requests fail fast
//! - `HalfOpen`: cooldown elapsed, a probe request is allowed through
//!
//! # Transitions
//!
//! ```text
//! Closed   -> Open:     failure_count reaches the threshold
//! Open     -> HalfOpen: recovery timeout elapses
//! HalfOpen -> Closed:   probe succeeds (failure count resets)
//! HalfOpen -> Open:     probe fails (cooldown restarts)
//! ```
//!
//! Open never transitions directly to Closed, and there is no terminal
//! state: upstream outages are expected to be transient, so the breaker
//! oscillates for the life of the client.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

/// The observable state of a [`CircuitBreaker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation; requests pass through.
    Closed,
    /// Failing fast; no requests reach the upstream.
    Open,
    /// Cooldown elapsed; probe requests are allowed through.
    HalfOpen,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Mutable breaker state; always accessed under the breaker's mutex.
#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Three-state failure isolator shared by all callers of one client.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use throttleql::{BreakerState, CircuitBreaker};
///
/// let breaker = CircuitBreaker::new(2, Duration::from_secs(30));
/// assert!(breaker.can_execute());
///
/// breaker.record_failure();
/// breaker.record_failure();
/// assert_eq!(breaker.state(), BreakerState::Open);
/// assert!(!breaker.can_execute());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    failure_threshold: u32,
    recovery_timeout: Duration,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    ///
    /// `failure_threshold` consecutive failures open it;
    /// `recovery_timeout` is the cooldown before a probe is allowed.
    #[must_use]
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
            failure_threshold,
            recovery_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().expect("circuit breaker lock poisoned")
    }

    /// Reports whether a request may proceed.
    ///
    /// In the `Open` state this returns `false` until the recovery timeout
    /// has elapsed since the last failure, at which point the breaker
    /// moves to `HalfOpen` and lets a probe through.
    #[must_use]
    pub fn can_execute(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let cooled_down = inner
                    .last_failure
                    .is_none_or(|at| at.elapsed() > self.recovery_timeout);
                if cooled_down {
                    inner.state = BreakerState::HalfOpen;
                    tracing::debug!("Circuit breaker cooldown elapsed; allowing a recovery probe");
                }
                cooled_down
            }
        }
    }

    /// Records a successful call, closing the breaker.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != BreakerState::Closed {
            tracing::debug!("Circuit breaker closed after successful probe");
        }
        inner.state = BreakerState::Closed;
        inner.failure_count = 0;
    }

    /// Records a failed call.
    ///
    /// In `Closed`, increments the failure count and opens the breaker at
    /// the threshold. In `HalfOpen`, reopens immediately and restarts the
    /// cooldown; the count is left untouched (it is already at or above
    /// the threshold, so the breaker cannot fall back to `Closed` by
    /// accident).
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    inner.state = BreakerState::Open;
                    inner.last_failure = Some(Instant::now());
                    tracing::warn!(
                        "Circuit breaker opened after {} consecutive failures",
                        inner.failure_count
                    );
                }
            }
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.last_failure = Some(Instant::now());
                tracing::warn!("Recovery probe failed; circuit breaker reopened");
            }
            BreakerState::Open => {
                // A straggler from a request already in flight when the
                // breaker opened; restart the cooldown.
                inner.last_failure = Some(Instant::now());
            }
        }
    }

    /// Returns the current state without mutating it.
    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Returns the current consecutive-failure count.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Returns the time until the next recovery probe, when open.
    #[must_use]
    pub fn retry_in(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.state, inner.last_failure) {
            (BreakerState::Open, Some(at)) => {
                Some(self.recovery_timeout.saturating_sub(at.elapsed()))
            }
            _ => None,
        }
    }
}

// Verify CircuitBreaker is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CircuitBreaker>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_breaker_is_closed_and_executable() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert!(breaker.can_execute());
    }

    #[test]
    fn test_failures_below_threshold_stay_closed() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.can_execute());
    }

    #[test]
    fn test_threshold_failures_open_the_breaker() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.can_execute());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        for _ in 0..4 {
            breaker.record_failure();
        }
        breaker.record_success();
        assert_eq!(breaker.failure_count(), 0);

        // A fresh run of failures is needed to open the breaker
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_breaker_allows_probe_after_recovery_timeout() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        for _ in 0..5 {
            breaker.record_failure();
        }

        // Inside the cooldown window: still failing fast
        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!breaker.can_execute());
        assert_eq!(breaker.state(), BreakerState::Open);

        // Past the cooldown: one probe is allowed and the state moves
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_probe_closes_the_breaker() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        for _ in 0..5 {
            breaker.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(breaker.can_execute());

        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_probe_reopens_the_breaker() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        for _ in 0..5 {
            breaker.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.can_execute());

        // The count never dropped below the threshold, so a later probe
        // failure cannot slip the breaker back into Closed
        assert!(breaker.failure_count() >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopened_breaker_restarts_cooldown() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(10));
        breaker.record_failure();
        breaker.record_failure();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(breaker.can_execute());
        breaker.record_failure();

        // The cooldown restarted at the probe failure
        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!breaker.can_execute());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(breaker.can_execute());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_in_reports_remaining_cooldown() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(10));
        assert!(breaker.retry_in().is_none());

        breaker.record_failure();
        let remaining = breaker.retry_in().expect("breaker is open");
        assert!(remaining <= Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(4)).await;
        let remaining = breaker.retry_in().expect("breaker is open");
        assert!(remaining <= Duration::from_secs(6));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(BreakerState::Closed.to_string(), "closed");
        assert_eq!(BreakerState::Open.to_string(), "open");
        assert_eq!(BreakerState::HalfOpen.to_string(), "half-open");
    }
}

//! Leaky-bucket tracking of the server's query-cost budget.
//!
//! The upstream API bills every operation in abstract cost points and
//! restores spent points continuously at a fixed rate. [`CostTracker`]
//! mirrors that budget locally so callers can wait for capacity instead of
//! burning requests into 429 responses, and re-synchronizes from the
//! server's own [`ThrottleStatus`] report whenever one arrives: the local
//! bucket is only ever an estimate between responses, because other clients
//! may be drawing on the same upstream account.
//!
//! Capacity is claimed through atomic reservations: checking for capacity
//! and debiting it happen in one critical section, so two concurrent
//! callers can never both spend the same points. A [`CostReservation`]
//! refunds itself when dropped unsettled, which keeps the bucket honest
//! when an attempt fails before any real cost is known.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::time::Instant;

/// The server's authoritative report of its cost budget.
///
/// Returned inside `extensions.cost.throttleStatus` on every billed
/// response. When present it replaces the local estimate wholesale.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStatus {
    /// Maximum points the bucket can hold.
    pub maximum_available: f64,
    /// Points available at the time the response was produced.
    pub currently_available: f64,
    /// Points restored per second.
    pub restore_rate: f64,
}

/// A point-in-time view of the budget, for health reporting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BudgetSnapshot {
    /// Maximum points the bucket can hold.
    pub capacity: f64,
    /// Points available right now.
    pub currently_available: f64,
    /// Points restored per second.
    pub restore_rate: f64,
}

/// Error returned when a capacity wait would exceed the configured bound.
///
/// Raised instead of sleeping indefinitely when the requested cost cannot
/// be served within the client's `max_capacity_wait` — typically because
/// the estimate exceeds the bucket's capacity outright, or the restore
/// rate reported by the server has collapsed.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Timed out waiting for {requested_cost} cost points (bucket capacity {capacity})")]
pub struct CapacityTimeoutError {
    /// The cost the caller asked to reserve.
    pub requested_cost: u32,
    /// The bucket capacity at the time the wait was abandoned.
    pub capacity: f64,
}

/// Mutable bucket state; always accessed under the tracker's mutex.
#[derive(Debug)]
struct BucketState {
    capacity: f64,
    current: f64,
    restore_rate: f64,
    last_update: Instant,
}

impl BucketState {
    /// Credits points restored since the last update, clamped to capacity.
    fn refresh(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.current = (self.current + elapsed * self.restore_rate).min(self.capacity);
        self.last_update = now;
    }

    /// Replaces the local estimate with the server's report.
    fn overwrite(&mut self, status: &ThrottleStatus) {
        self.capacity = status.maximum_available;
        self.restore_rate = status.restore_rate;
        self.current = status.currently_available.clamp(0.0, self.capacity);
    }
}

/// Leaky-bucket budget tracker for server cost points.
///
/// One tracker exists per client instance and is shared by all concurrent
/// callers. All operations take a single short critical section; the lock
/// is never held across an await point.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use throttleql::CostTracker;
///
/// let tracker = CostTracker::new(1000.0, 50.0, Duration::from_secs(60));
/// assert!(tracker.can_execute(1000));
/// assert!(!tracker.can_execute(1001));
///
/// tracker.record_cost(50, None);
/// let budget = tracker.snapshot();
/// assert!(budget.currently_available <= 950.0 + f64::EPSILON);
/// ```
#[derive(Debug)]
pub struct CostTracker {
    state: Mutex<BucketState>,
    max_wait: Duration,
}

impl CostTracker {
    /// Creates a tracker with a full bucket.
    ///
    /// `capacity` and `restore_rate` are the local assumptions used until
    /// the server reports its own values; `max_wait` bounds how long
    /// [`wait_for_capacity`](Self::wait_for_capacity) may sleep in total.
    #[must_use]
    pub fn new(capacity: f64, restore_rate: f64, max_wait: Duration) -> Self {
        Self {
            state: Mutex::new(BucketState {
                capacity,
                current: capacity,
                restore_rate,
                last_update: Instant::now(),
            }),
            max_wait,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().expect("cost tracker lock poisoned")
    }

    /// Reports whether `cost` points are available right now.
    ///
    /// Refreshes the bucket as a side effect but does not debit it. This
    /// is a pre-flight hint only; use [`try_reserve`](Self::try_reserve)
    /// to actually claim capacity.
    #[must_use]
    pub fn can_execute(&self, cost: u32) -> bool {
        let mut state = self.lock();
        state.refresh(Instant::now());
        state.current >= f64::from(cost)
    }

    /// Atomically claims `cost` points if they are available.
    ///
    /// Check and debit happen in one critical section, so concurrent
    /// callers can never both spend the same points. The returned
    /// reservation refunds itself on drop unless settled.
    #[must_use]
    pub fn try_reserve(&self, cost: u32) -> Option<CostReservation<'_>> {
        let needed = f64::from(cost);
        let mut state = self.lock();
        state.refresh(Instant::now());
        if state.current >= needed {
            state.current -= needed;
            Some(CostReservation {
                tracker: self,
                amount: Some(needed),
            })
        } else {
            None
        }
    }

    /// Suspends the calling task until `cost` points have been reserved.
    ///
    /// Sleeps in increments of `deficit / restore_rate` and re-checks on
    /// wake. Only the calling task is suspended; dropping the returned
    /// future cancels the wait cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityTimeoutError`] once the accumulated wait would
    /// exceed the tracker's `max_wait` bound — in particular immediately
    /// when `cost` exceeds the bucket's capacity.
    pub async fn wait_for_capacity(
        &self,
        cost: u32,
    ) -> Result<CostReservation<'_>, CapacityTimeoutError> {
        let mut waited = Duration::ZERO;
        loop {
            let (deficit, rate, capacity) = {
                let needed = f64::from(cost);
                let mut state = self.lock();
                state.refresh(Instant::now());
                if state.current >= needed {
                    state.current -= needed;
                    return Ok(CostReservation {
                        tracker: self,
                        amount: Some(needed),
                    });
                }
                (needed - state.current, state.restore_rate, state.capacity)
            };

            // A stalled restore rate can never fill the deficit; burn the
            // remaining wait budget in one sleep and fail on the next pass.
            let sleep_for = if rate > 0.0 {
                Duration::from_secs_f64(deficit / rate) + Duration::from_millis(1)
            } else {
                self.max_wait
            };

            if waited + sleep_for > self.max_wait {
                tracing::warn!(
                    "Abandoning capacity wait: {cost} points not restorable within {:?} (capacity {capacity})",
                    self.max_wait
                );
                return Err(CapacityTimeoutError {
                    requested_cost: cost,
                    capacity,
                });
            }

            tracing::debug!("Waiting {sleep_for:?} for {deficit:.1} cost points to restore");
            tokio::time::sleep(sleep_for).await;
            waited += sleep_for;
        }
    }

    /// Records the cost the server actually billed.
    ///
    /// Refreshes, then debits `actual_cost` (floored at zero). When the
    /// response carried a [`ThrottleStatus`], the server's view replaces
    /// the local estimate entirely: local restore-rate assumptions drift
    /// from reality when several clients draw on the same account.
    pub fn record_cost(&self, actual_cost: u32, status: Option<&ThrottleStatus>) {
        let mut state = self.lock();
        state.refresh(Instant::now());
        state.current = (state.current - f64::from(actual_cost)).max(0.0);
        if let Some(status) = status {
            state.overwrite(status);
        }
    }

    /// Returns the current budget, refreshed to now.
    #[must_use]
    pub fn snapshot(&self) -> BudgetSnapshot {
        let mut state = self.lock();
        state.refresh(Instant::now());
        BudgetSnapshot {
            capacity: state.capacity,
            currently_available: state.current,
            restore_rate: state.restore_rate,
        }
    }

    /// Credits refunded points back, clamped to capacity.
    fn refund(&self, amount: f64) {
        let mut state = self.lock();
        state.refresh(Instant::now());
        state.current = (state.current + amount).min(state.capacity);
    }

    /// Settles a reservation against the cost the server actually billed.
    fn reconcile(&self, reserved: f64, actual: f64, status: Option<&ThrottleStatus>) {
        let mut state = self.lock();
        state.refresh(Instant::now());
        state.current = (state.current + reserved - actual).clamp(0.0, state.capacity);
        if let Some(status) = status {
            state.overwrite(status);
        }
    }
}

// Verify CostTracker is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CostTracker>();
};

/// Capacity claimed from a [`CostTracker`] for one attempt.
///
/// Created by [`CostTracker::try_reserve`] and
/// [`CostTracker::wait_for_capacity`]. Call
/// [`settle`](CostReservation::settle) once the server reports the actual
/// cost; dropping an unsettled reservation refunds it in full, so attempts
/// that fail before any cost is known (network errors, 429s, cancelled
/// futures) never leak budget.
#[derive(Debug)]
pub struct CostReservation<'a> {
    tracker: &'a CostTracker,
    amount: Option<f64>,
}

impl CostReservation<'_> {
    /// Replaces the reserved estimate with the cost the server billed,
    /// then applies the server's throttle report when present.
    pub fn settle(mut self, actual_cost: u32, status: Option<&ThrottleStatus>) {
        if let Some(reserved) = self.amount.take() {
            self.tracker
                .reconcile(reserved, f64::from(actual_cost), status);
        }
    }
}

impl Drop for CostReservation<'_> {
    fn drop(&mut self) {
        if let Some(reserved) = self.amount.take() {
            self.tracker.refund(reserved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(capacity: f64, rate: f64) -> CostTracker {
        CostTracker::new(capacity, rate, Duration::from_secs(60))
    }

    #[test]
    fn test_new_tracker_starts_full() {
        let tracker = tracker(1000.0, 50.0);
        let budget = tracker.snapshot();
        assert!((budget.capacity - 1000.0).abs() < f64::EPSILON);
        assert!((budget.currently_available - 1000.0).abs() < 1e-6);
        assert!((budget.restore_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_can_execute_checks_without_debiting() {
        let tracker = tracker(1000.0, 50.0);
        assert!(tracker.can_execute(1000));
        assert!(!tracker.can_execute(1001));
        // Checking must not have spent anything
        assert!(tracker.can_execute(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_cost_debits_current() {
        let tracker = tracker(1000.0, 50.0);
        tracker.record_cost(50, None);
        let budget = tracker.snapshot();
        assert!(budget.currently_available <= 950.0 + 1e-6);
        assert!(budget.currently_available >= 949.0);
    }

    #[test]
    fn test_record_cost_floors_at_zero() {
        let tracker = tracker(1000.0, 50.0);
        tracker.record_cost(5000, None);
        let budget = tracker.snapshot();
        assert!(budget.currently_available >= 0.0);
        assert!(budget.currently_available < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_refills_and_clamps_at_capacity() {
        let tracker = tracker(1000.0, 50.0);
        tracker.record_cost(50, None);

        // Two simulated seconds restore 100 points, clamped to capacity
        tokio::time::advance(Duration::from_secs(2)).await;
        let budget = tracker.snapshot();
        assert!((budget.currently_available - 1000.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_restore_is_continuous() {
        let tracker = tracker(1000.0, 50.0);
        tracker.record_cost(500, None);

        tokio::time::advance(Duration::from_secs(4)).await;
        let budget = tracker.snapshot();
        // 500 + 4 * 50 = 700
        assert!((budget.currently_available - 700.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_status_overwrites_local_state_exactly() {
        let tracker = tracker(500.0, 10.0);
        let status = ThrottleStatus {
            maximum_available: 1000.0,
            currently_available: 200.0,
            restore_rate: 100.0,
        };

        tracker.record_cost(0, Some(&status));

        let budget = tracker.snapshot();
        assert!((budget.capacity - 1000.0).abs() < f64::EPSILON);
        assert!((budget.currently_available - 200.0).abs() < 1e-6);
        assert!((budget.restore_rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_throttle_status_clamps_reported_available_to_capacity() {
        let tracker = tracker(500.0, 10.0);
        let status = ThrottleStatus {
            maximum_available: 100.0,
            currently_available: 250.0,
            restore_rate: 5.0,
        };

        tracker.record_cost(0, Some(&status));

        let budget = tracker.snapshot();
        assert!((budget.capacity - 100.0).abs() < f64::EPSILON);
        assert!((budget.currently_available - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_try_reserve_claims_atomically() {
        let tracker = tracker(100.0, 10.0);
        let reservation = tracker.try_reserve(80).expect("capacity available");
        // The remaining 20 points cannot cover a second 80-point claim
        assert!(tracker.try_reserve(80).is_none());
        drop(reservation);
    }

    #[test]
    fn test_dropped_reservation_refunds() {
        let tracker = tracker(100.0, 10.0);
        let reservation = tracker.try_reserve(80).expect("capacity available");
        drop(reservation);
        let budget = tracker.snapshot();
        assert!(budget.currently_available >= 99.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_replaces_estimate_with_actual() {
        let tracker = tracker(100.0, 10.0);
        let reservation = tracker.try_reserve(80).expect("capacity available");
        reservation.settle(30, None);
        let budget = tracker.snapshot();
        // 80 reserved, 30 billed: 50 points come back
        assert!(budget.currently_available >= 69.0);
        assert!(budget.currently_available <= 70.0 + 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_applies_server_report() {
        let tracker = tracker(100.0, 10.0);
        let reservation = tracker.try_reserve(80).expect("capacity available");
        let status = ThrottleStatus {
            maximum_available: 2000.0,
            currently_available: 1500.0,
            restore_rate: 100.0,
        };
        reservation.settle(80, Some(&status));
        let budget = tracker.snapshot();
        assert!((budget.capacity - 2000.0).abs() < f64::EPSILON);
        assert!((budget.currently_available - 1500.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_capacity_reserves_before_returning() {
        let tracker = tracker(100.0, 10.0);
        tracker.record_cost(100, None);

        let started = Instant::now();
        let reservation = tracker.wait_for_capacity(50).await.expect("within bound");

        // The deficit of 50 points takes 5 seconds to restore at 10/s
        assert!(started.elapsed() >= Duration::from_secs(5));
        // The reservation already holds the points: nothing left over
        assert!(tracker.snapshot().currently_available < 1.0);
        drop(reservation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_capacity_returns_immediately_when_available() {
        let tracker = tracker(100.0, 10.0);
        let started = Instant::now();
        let reservation = tracker.wait_for_capacity(40).await.expect("available");
        assert!(started.elapsed() < Duration::from_millis(10));
        drop(reservation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_capacity_times_out_when_cost_exceeds_capacity() {
        let tracker = CostTracker::new(100.0, 10.0, Duration::from_secs(5));
        let result = tracker.wait_for_capacity(200).await;
        assert!(matches!(
            result,
            Err(CapacityTimeoutError {
                requested_cost: 200,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_stays_within_bounds_under_mixed_operations() {
        let tracker = tracker(1000.0, 50.0);
        for _ in 0..5 {
            tracker.record_cost(400, None);
            let budget = tracker.snapshot();
            assert!(budget.currently_available >= 0.0);
            assert!(budget.currently_available <= budget.capacity + 1e-6);
            tokio::time::advance(Duration::from_secs(3)).await;
            let budget = tracker.snapshot();
            assert!(budget.currently_available >= 0.0);
            assert!(budget.currently_available <= budget.capacity + 1e-6);
        }
    }

    #[test]
    fn test_throttle_status_deserializes_from_camel_case() {
        let status: ThrottleStatus = serde_json::from_str(
            r#"{"maximumAvailable":1000.0,"currentlyAvailable":950.0,"restoreRate":50.0}"#,
        )
        .unwrap();
        assert!((status.maximum_available - 1000.0).abs() < f64::EPSILON);
        assert!((status.currently_available - 950.0).abs() < f64::EPSILON);
        assert!((status.restore_rate - 50.0).abs() < f64::EPSILON);
    }
}

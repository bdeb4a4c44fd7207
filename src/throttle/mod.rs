//! Throttling primitives shared by every request path.
//!
//! This module provides the two stateful components that stand between
//! callers and the upstream API:
//!
//! - [`CostTracker`]: a leaky-bucket budget for the server's cost-point
//!   currency, refilled continuously and corrected by the server's own
//!   throttle reports
//! - [`CircuitBreaker`]: a three-state failure isolator that stops calls to
//!   a consistently failing upstream until a cooldown elapses
//!
//! Both are owned by the client's request executor; one instance of each
//! exists per client and is shared by all concurrent callers.

mod circuit_breaker;
mod cost_tracker;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use cost_tracker::{
    BudgetSnapshot, CapacityTimeoutError, CostReservation, CostTracker, ThrottleStatus,
};

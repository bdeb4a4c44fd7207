//! Error types surfaced while executing GraphQL requests.
//!
//! This module contains error types for every non-success outcome of a
//! request: fail-fast rejections, retry exhaustion, fatal upstream statuses,
//! and operation-level GraphQL errors.
//!
//! # Error Handling
//!
//! Each failure class has its own concrete type so callers can distinguish
//! "the upstream is down" from "this specific operation is invalid":
//!
//! - [`CircuitOpenError`]: the circuit breaker is open; no request was sent
//! - [`MaxRetriesExceededError`]: a transient failure persisted through every attempt
//! - [`OperationError`]: the server rejected the operation itself (HTTP 200 with errors)
//! - [`UpstreamStatusError`]: a fatal, non-retryable HTTP status
//! - [`RequestTimeoutError`]: the caller's deadline expired mid-flight
//! - [`InvalidOperationError`]: the request failed validation before sending
//! - [`ClientError`]: unified error type encompassing all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use throttleql::ClientError;
//!
//! match client.execute_query(query, None, None).await {
//!     Ok(result) => println!("Data: {}", result.data),
//!     Err(ClientError::CircuitOpen(e)) => {
//!         println!("Upstream unavailable; probe in {:?}", e.retry_in);
//!     }
//!     Err(ClientError::Operation(e)) => {
//!         println!("Query rejected after {} attempt(s): {}", e.attempts, e);
//!     }
//!     Err(other) => println!("Request failed: {other}"),
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::clients::response::ResponseError;
use crate::throttle::CapacityTimeoutError;

/// Error returned when the circuit breaker refuses a request.
///
/// No network call was made; the upstream is assumed to still be failing.
/// `retry_in` carries the remaining cooldown before the breaker will allow
/// a recovery probe, when known.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Circuit breaker is open; request not sent.")]
pub struct CircuitOpenError {
    /// Time until the breaker allows the next recovery probe, if known.
    pub retry_in: Option<Duration>,
}

/// Error returned when maximum retry attempts have been exhausted.
///
/// Raised when a request keeps failing with a transient class (429, 5xx, or
/// a transport error) after every configured attempt has been made.
///
/// # Example
///
/// ```rust
/// use throttleql::MaxRetriesExceededError;
///
/// let error = MaxRetriesExceededError {
///     code: Some(500),
///     attempts: 3,
///     message: r#"{"errors":"Internal Server Error"}"#.to_string(),
/// };
///
/// println!("{error}"); // "Exceeded maximum attempt count of 3. Last message: ..."
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Exceeded maximum attempt count of {attempts}. Last message: {message}")]
pub struct MaxRetriesExceededError {
    /// The HTTP status code of the last response, when one was received.
    pub code: Option<u16>,
    /// The number of attempts that were made.
    pub attempts: u32,
    /// Serialized error message from the last failure.
    pub message: String,
}

/// Error returned when the server rejects the operation itself.
///
/// The upstream answered HTTP 200 but reported top-level GraphQL errors
/// with no data. Retrying a semantically invalid operation is never useful,
/// so this error surfaces after a single attempt.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct OperationError {
    /// Serialized error message in JSON format.
    pub message: String,
    /// The server-reported GraphQL errors, in response order.
    pub errors: Vec<ResponseError>,
    /// The number of attempts made before the error surfaced.
    pub attempts: u32,
}

/// Error returned for a fatal, non-retryable HTTP status.
///
/// Covers 4xx statuses other than 429 (authentication failures, missing
/// endpoints). These indicate a caller-side problem, so they are not
/// retried and do not affect the circuit breaker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamStatusError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Serialized error message from the response body.
    pub message: String,
    /// Reference ID for error reporting, when the upstream supplied one.
    pub request_id: Option<String>,
}

/// Error returned when the caller's deadline expires mid-flight.
///
/// A caller-imposed timeout is not evidence of upstream unhealthiness, so
/// this error leaves the circuit breaker untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Request deadline exceeded after {attempts} attempt(s).")]
pub struct RequestTimeoutError {
    /// The number of attempts started before the deadline expired.
    pub attempts: u32,
}

/// Error returned when a request fails validation before sending.
///
/// Raised by request construction when the operation string does not match
/// the path it was routed through. The query and mutation paths carry
/// different cost-estimate defaults, so a misrouted operation would be
/// budgeted wrongly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidOperationError {
    /// The operation string is empty.
    #[error("Operation cannot be empty.")]
    Empty,

    /// An operation routed through the mutation path does not start with
    /// the `mutation` keyword.
    #[error("Operation sent as a mutation must begin with the 'mutation' keyword.")]
    ExpectedMutation,

    /// An operation routed through the query path starts with the
    /// `mutation` keyword.
    #[error("Operation sent as a query must not begin with the 'mutation' keyword.")]
    UnexpectedMutation,
}

/// Unified error type for all request failures.
///
/// This enum provides a single error type for client operations, making it
/// easier to handle errors at API boundaries. Use pattern matching to
/// handle specific failure classes.
///
/// # Example
///
/// ```rust,ignore
/// use throttleql::ClientError;
///
/// match client.execute_query(query, None, None).await {
///     Ok(result) => { /* handle success */ }
///     Err(ClientError::CircuitOpen(e)) => { /* upstream assumed down */ }
///     Err(ClientError::MaxRetries(e)) => { /* transient fault persisted */ }
///     Err(ClientError::Operation(e)) => { /* the operation itself is invalid */ }
///     Err(other) => { /* remaining classes */ }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ClientError {
    /// The circuit breaker is open; the request was not sent.
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),

    /// Maximum retry attempts exhausted on a transient failure.
    #[error(transparent)]
    MaxRetries(#[from] MaxRetriesExceededError),

    /// The server rejected the operation (HTTP 200 with top-level errors).
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// A fatal, non-retryable HTTP status was received.
    #[error(transparent)]
    UpstreamStatus(#[from] UpstreamStatusError),

    /// The cost budget could not serve the request within the wait bound.
    #[error(transparent)]
    CapacityTimeout(#[from] CapacityTimeoutError),

    /// The caller's deadline expired before the request completed.
    #[error(transparent)]
    Timeout(#[from] RequestTimeoutError),

    /// The request failed validation before sending.
    #[error(transparent)]
    InvalidOperation(#[from] InvalidOperationError),

    /// Network or connection error on a single-attempt request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

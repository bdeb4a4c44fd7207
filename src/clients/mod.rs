//! Request execution layer for the GraphQL endpoint.
//!
//! This module provides the transport and orchestration layer of the
//! client: typed requests and responses, the retrying executor, and the
//! error taxonomy for every non-success path.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`graphql::GraphqlClient`]: the high-level facade for queries and mutations
//! - [`RequestExecutor`]: transport ownership, retry/backoff, and throttle orchestration
//! - [`GraphqlRequest`]: an operation to be executed, with per-request overrides
//! - [`QueryResult`]: the typed result of a successful operation
//! - [`GraphqlResponse`]: the wire envelope, decoded once at the transport boundary
//! - [`ClientError`]: unified error type over every failure class
//!
//! # Retry Behavior
//!
//! The executor retries transient failures up to the configured attempt
//! budget:
//!
//! - **429 (Rate Limited)**: sleeps the `Retry-After` value (1 second when
//!   absent) and retries; counts toward the circuit breaker only when the
//!   attempt budget is exhausted
//! - **5xx / transport errors**: exponential backoff, capped
//! - **Other 4xx**: fatal immediately, never retried, breaker untouched
//! - **200 with top-level errors and no data**: fatal immediately; the
//!   operation itself is invalid, so retrying cannot help
//!
//! Every attempt is gated by the circuit breaker and budgeted against the
//! cost tracker before any bytes hit the network.

mod errors;
mod executor;
pub mod graphql;
mod request;
mod response;

pub use errors::{
    CircuitOpenError, ClientError, InvalidOperationError, MaxRetriesExceededError, OperationError,
    RequestTimeoutError, UpstreamStatusError,
};
pub use executor::{RequestExecutor, CLIENT_VERSION};
pub use request::{GraphqlRequest, GraphqlRequestBuilder, OperationKind};
pub use response::{
    GraphqlResponse, QueryCost, QueryResult, ResponseError, ResponseExtensions,
    DEFAULT_RETRY_AFTER,
};

// Re-export the facade at the clients module level
pub use graphql::GraphqlClient;

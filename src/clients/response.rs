//! Response types for GraphQL operations.
//!
//! This module provides the typed response envelope decoded once at the
//! transport boundary, and the [`QueryResult`] returned to callers.

use serde::{Deserialize, Serialize};

use crate::throttle::ThrottleStatus;

/// Default seconds to wait when a 429 response carries no `Retry-After`.
pub const DEFAULT_RETRY_AFTER: f64 = 1.0;

/// A single server-reported GraphQL error.
///
/// Errors may accompany partial data on a successful response, or appear
/// alone when the operation itself was rejected.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ResponseError {
    /// Human-readable description of the error.
    pub message: String,
    /// Path into the operation the error applies to, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
    /// Upstream-specific error details, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// The server's cost report for one operation.
///
/// Returned inside `extensions.cost` on billed responses.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCost {
    /// The cost the server computed for the operation before execution.
    pub requested_query_cost: u32,
    /// The cost the server actually billed.
    ///
    /// Can be lower than the requested cost when the operation returned
    /// fewer nodes than its worst case.
    #[serde(default)]
    pub actual_query_cost: Option<u32>,
    /// The authoritative budget report, when included.
    #[serde(default)]
    pub throttle_status: Option<ThrottleStatus>,
}

impl QueryCost {
    /// Returns the billed cost, falling back to the requested cost when the
    /// server omitted it.
    #[must_use]
    pub fn billed(&self) -> u32 {
        self.actual_query_cost.unwrap_or(self.requested_query_cost)
    }
}

/// The `extensions` member of the response envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResponseExtensions {
    /// Cost accounting for the operation, when the upstream reports it.
    #[serde(default)]
    pub cost: Option<QueryCost>,
}

/// The full GraphQL response envelope, decoded at the transport boundary.
///
/// All fields are optional on the wire; [`GraphqlResponse::is_operation_failure`]
/// classifies the envelope the way the retry loop needs it.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphqlResponse {
    /// The operation's result data. `null` and absent are equivalent.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Server-reported errors, in response order.
    #[serde(default)]
    pub errors: Option<Vec<ResponseError>>,
    /// Envelope extensions (cost accounting).
    #[serde(default)]
    pub extensions: Option<ResponseExtensions>,
}

impl GraphqlResponse {
    /// Returns the cost report, when the envelope carries one.
    #[must_use]
    pub fn cost(&self) -> Option<&QueryCost> {
        self.extensions.as_ref().and_then(|ext| ext.cost.as_ref())
    }

    /// Reports whether this envelope is an operation-level failure: errors
    /// are present and no data came back at all.
    ///
    /// Partial errors alongside data are not a failure; they are returned
    /// to the caller inside the [`QueryResult`].
    #[must_use]
    pub fn is_operation_failure(&self) -> bool {
        self.data.is_none() && self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

/// The result of a successfully executed operation.
///
/// `errors` may be non-empty alongside `data` when the server returned
/// partial results.
#[derive(Clone, Debug)]
pub struct QueryResult {
    /// The operation's result data.
    pub data: serde_json::Value,
    /// Partial errors reported alongside the data, in response order.
    pub errors: Vec<ResponseError>,
    /// Cost accounting for the operation, when the upstream reported it.
    pub cost: Option<QueryCost>,
}

/// Parses the `Retry-After` header into seconds, when present and numeric.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<f64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
}

/// Extracts the upstream's request ID header, when present.
pub(crate) fn request_id(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

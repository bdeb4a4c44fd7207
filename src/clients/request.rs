//! Request types for GraphQL operations.
//!
//! This module provides the [`GraphqlRequest`] type and its builder for
//! constructing operations to execute against the endpoint.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::clients::errors::InvalidOperationError;

/// The kind of GraphQL operation being executed.
///
/// The two kinds carry different cost-estimate defaults, so a request's
/// kind must match the operation string it carries (see
/// [`GraphqlRequest::verify`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    /// A read operation.
    Query,
    /// A write operation; the operation string must start with `mutation`.
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

/// Reports whether an operation string lexically begins with the `mutation`
/// keyword (ignoring leading whitespace).
fn starts_with_mutation_keyword(operation: &str) -> bool {
    operation
        .trim_start()
        .strip_prefix("mutation")
        .is_some_and(|rest| {
            rest.chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric() && c != '_')
        })
}

/// A GraphQL operation to be executed against the endpoint.
///
/// Use [`GraphqlRequest::query`] or [`GraphqlRequest::mutation`] to
/// construct requests with the builder pattern.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use throttleql::GraphqlRequest;
///
/// // Simple query
/// let request = GraphqlRequest::query("query { shop { name } }")
///     .build()
///     .unwrap();
///
/// // Mutation with variables and a cost hint
/// let request = GraphqlRequest::mutation(
///     "mutation CreateOrder($input: OrderInput!) { orderCreate(input: $input) { id } }",
/// )
/// .variables(json!({ "input": { "lineItems": [] } }))
/// .estimated_cost(10)
/// .build()
/// .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct GraphqlRequest {
    /// The kind of operation this request carries.
    pub kind: OperationKind,
    /// The operation string (query or mutation document).
    pub operation: String,
    /// Variables for the operation, if any.
    pub variables: Option<serde_json::Value>,
    /// Caller-supplied cost hint used for the pre-flight capacity check.
    ///
    /// When absent, the client's configured default for the operation kind
    /// is used. This is a hint only; the server's billed cost wins.
    pub estimated_cost: Option<u32>,
    /// Per-request override of the configured attempt count.
    pub max_attempts: Option<u32>,
    /// Per-request deadline covering every attempt, wait, and backoff.
    pub timeout: Option<Duration>,
    /// Additional headers to include in the request.
    pub extra_headers: Option<HashMap<String, String>>,
}

impl GraphqlRequest {
    /// Creates a builder for a query operation.
    #[must_use]
    pub fn query(operation: impl Into<String>) -> GraphqlRequestBuilder {
        GraphqlRequestBuilder::new(OperationKind::Query, operation)
    }

    /// Creates a builder for a mutation operation.
    #[must_use]
    pub fn mutation(operation: impl Into<String>) -> GraphqlRequestBuilder {
        GraphqlRequestBuilder::new(OperationKind::Mutation, operation)
    }

    /// Validates the request, ensuring the operation matches its kind.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOperationError`] if:
    /// - the operation string is empty
    /// - the kind is [`OperationKind::Mutation`] but the operation does not
    ///   begin with the `mutation` keyword
    /// - the kind is [`OperationKind::Query`] but the operation begins with
    ///   the `mutation` keyword
    pub fn verify(&self) -> Result<(), InvalidOperationError> {
        if self.operation.trim().is_empty() {
            return Err(InvalidOperationError::Empty);
        }

        let is_mutation = starts_with_mutation_keyword(&self.operation);
        match self.kind {
            OperationKind::Mutation if !is_mutation => Err(InvalidOperationError::ExpectedMutation),
            OperationKind::Query if is_mutation => Err(InvalidOperationError::UnexpectedMutation),
            _ => Ok(()),
        }
    }
}

/// Builder for constructing [`GraphqlRequest`] instances.
///
/// Provides a fluent API for building requests with optional parameters.
#[derive(Debug)]
pub struct GraphqlRequestBuilder {
    kind: OperationKind,
    operation: String,
    variables: Option<serde_json::Value>,
    estimated_cost: Option<u32>,
    max_attempts: Option<u32>,
    timeout: Option<Duration>,
    extra_headers: Option<HashMap<String, String>>,
}

impl GraphqlRequestBuilder {
    /// Creates a new builder with the required kind and operation.
    fn new(kind: OperationKind, operation: impl Into<String>) -> Self {
        Self {
            kind,
            operation: operation.into(),
            variables: None,
            estimated_cost: None,
            max_attempts: None,
            timeout: None,
            extra_headers: None,
        }
    }

    /// Sets the variables for the operation.
    #[must_use]
    pub fn variables(mut self, variables: impl Into<serde_json::Value>) -> Self {
        self.variables = Some(variables.into());
        self
    }

    /// Sets the cost hint used for the pre-flight capacity check.
    #[must_use]
    pub const fn estimated_cost(mut self, cost: u32) -> Self {
        self.estimated_cost = Some(cost);
        self
    }

    /// Overrides the configured attempt count for this request.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets a deadline covering every attempt of this request.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets all extra headers at once.
    #[must_use]
    pub fn extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Adds a single extra header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Builds the [`GraphqlRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOperationError`] if the request fails validation.
    pub fn build(self) -> Result<GraphqlRequest, InvalidOperationError> {
        let request = GraphqlRequest {
            kind: self.kind,
            operation: self.operation,
            variables: self.variables,
            estimated_cost: self.estimated_cost,
            max_attempts: self.max_attempts,
            timeout: self.timeout,
            extra_headers: self.extra_headers,
        };
        request.verify()?;
        Ok(request)
    }
}

//! # throttleql
//!
//! A cost-aware, resilient GraphQL client for endpoints that enforce
//! point-based query-cost throttling: the server bills every operation in
//! abstract cost points, reports how many remain, and restores spent
//! points continuously over time.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - A leaky-bucket cost budget ([`CostTracker`]) kept consistent with the
//!   server's own throttle reports
//! - A three-state circuit breaker ([`CircuitBreaker`]) with timed recovery
//!   probing for sustained upstream outages
//! - A retrying executor that honors `Retry-After`, backs off exponentially
//!   on server faults, and never retries semantically invalid operations
//! - A typed response envelope (`data`, `errors`, `extensions.cost`)
//!   decoded once at the transport boundary
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use throttleql::{AccessToken, ClientConfig, EndpointUrl, GraphqlClient, StaticToken};
//!
//! // Create configuration using the builder pattern
//! let config = ClientConfig::builder()
//!     .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
//!     .bucket_capacity(1000.0)
//!     .restore_rate(50.0)
//!     .build()
//!     .unwrap();
//!
//! // Token acquisition lives outside this crate; wrap a ready-to-use
//! // token, or implement TokenProvider for rotating credentials
//! let token = StaticToken::new(AccessToken::new("my-token").unwrap());
//!
//! let client = GraphqlClient::new(config, Arc::new(token));
//! ```
//!
//! ## Executing Operations
//!
//! ```rust,ignore
//! use serde_json::json;
//!
//! // Simple query; the configured query cost default budgets the call
//! let result = client
//!     .execute_query("query { shop { name } }", None, None)
//!     .await?;
//! println!("Shop: {}", result.data["shop"]["name"]);
//!
//! // Mutation with variables and an explicit cost hint
//! let result = client
//!     .execute_mutation(
//!         "mutation CreateOrder($input: OrderInput!) { orderCreate(input: $input) { id } }",
//!         Some(json!({ "input": { "lineItems": [] } })),
//!         Some(25),
//!     )
//!     .await?;
//!
//! // Pre-built request with per-request overrides
//! use std::time::Duration;
//! use throttleql::GraphqlRequest;
//!
//! let request = GraphqlRequest::query("query { orders(first: 50) { edges { node { id } } } }")
//!     .estimated_cost(52)
//!     .max_attempts(5)
//!     .timeout(Duration::from_secs(20))
//!     .build()?;
//! let result = client.execute(&request).await?;
//! ```
//!
//! ## Budget and Breaker Introspection
//!
//! One client owns one budget and one breaker; share it across tasks so
//! the local estimate tracks everything billed to the upstream account:
//!
//! ```rust,ignore
//! let budget = client.budget_snapshot();
//! println!(
//!     "{:.0}/{:.0} points, restoring {:.0}/s, breaker {}",
//!     budget.currently_available,
//!     budget.capacity,
//!     budget.restore_rate,
//!     client.breaker_state(),
//! );
//! ```
//!
//! ## Error Handling
//!
//! Every non-success path returns a typed [`ClientError`] carrying the
//! last HTTP status (when any), the server's GraphQL error list (when
//! any), and the number of attempts made, so callers can distinguish
//! "the upstream is down" from "this specific operation is invalid":
//!
//! ```rust,ignore
//! use throttleql::ClientError;
//!
//! match client.execute_query(query, None, None).await {
//!     Ok(result) => { /* handle data */ }
//!     Err(ClientError::CircuitOpen(e)) => { /* fail fast; probe in e.retry_in */ }
//!     Err(ClientError::MaxRetries(e)) => { /* transient fault outlived the budget */ }
//!     Err(ClientError::Operation(e)) => { /* the operation itself was rejected */ }
//!     Err(other) => { /* capacity timeout, deadline, fatal status, ... */ }
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Server truth wins**: local budget estimation is only a fallback
//!   between the server's own throttle reports
//! - **Reserve, then send**: capacity checks and debits are one atomic
//!   operation, refunded when an attempt fails before a cost is known
//! - **Thread-safe**: all types are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime; waits
//!   suspend only the calling task and cancel cleanly

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod throttle;

// Re-export public types at crate root for convenience
pub use auth::{StaticToken, TokenProvider};
pub use config::{AccessToken, ClientConfig, ClientConfigBuilder, EndpointUrl};
pub use error::ConfigError;

// Re-export request execution types
pub use clients::{
    CircuitOpenError, ClientError, GraphqlClient, GraphqlRequest, GraphqlRequestBuilder,
    GraphqlResponse, InvalidOperationError, MaxRetriesExceededError, OperationError, OperationKind,
    QueryCost, QueryResult, RequestExecutor, RequestTimeoutError, ResponseError,
    UpstreamStatusError,
};

// Re-export throttle primitives
pub use throttle::{
    BreakerState, BudgetSnapshot, CapacityTimeoutError, CircuitBreaker, CostTracker,
    ThrottleStatus,
};

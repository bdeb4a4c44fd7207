//! GraphQL client facade.
//!
//! This module provides the [`GraphqlClient`] type for executing queries
//! and mutations against a cost-throttled GraphQL endpoint.

use std::sync::Arc;

use crate::auth::TokenProvider;
use crate::clients::errors::ClientError;
use crate::clients::executor::RequestExecutor;
use crate::clients::request::GraphqlRequest;
use crate::clients::response::QueryResult;
use crate::config::ClientConfig;
use crate::throttle::{BreakerState, BudgetSnapshot};

/// Client for a single cost-throttled GraphQL endpoint.
///
/// Provides [`execute_query`](Self::execute_query) and
/// [`execute_mutation`](Self::execute_mutation) for the common paths, and
/// [`execute`](Self::execute) for pre-built requests carrying per-request
/// overrides. One client owns one cost budget and one circuit breaker;
/// every caller sharing the client draws on the same budget.
///
/// # Thread Safety
///
/// `GraphqlClient` is `Send + Sync`. Share one instance (e.g. in an `Arc`)
/// across all tasks talking to the same endpoint, so the budget tracking
/// reflects everything the upstream account is being billed for.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use throttleql::{
///     AccessToken, ClientConfig, EndpointUrl, GraphqlClient, StaticToken,
/// };
///
/// let config = ClientConfig::builder()
///     .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
///     .build()
///     .unwrap();
/// let token = StaticToken::new(AccessToken::new("my-token").unwrap());
/// let client = GraphqlClient::new(config, Arc::new(token));
///
/// // Simple query
/// let result = client
///     .execute_query("query { shop { name } }", None, None)
///     .await?;
/// println!("Shop: {}", result.data["shop"]["name"]);
///
/// // Mutation with variables and a cost hint
/// let result = client
///     .execute_mutation(
///         "mutation CreateOrder($input: OrderInput!) { orderCreate(input: $input) { id } }",
///         Some(serde_json::json!({ "input": { "lineItems": [] } })),
///         Some(25),
///     )
///     .await?;
/// ```
#[derive(Debug)]
pub struct GraphqlClient {
    /// The executor owning the transport and throttle components.
    executor: RequestExecutor,
}

// Verify GraphqlClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

impl GraphqlClient {
    /// Creates a new client for the configured endpoint.
    ///
    /// The token provider is asked for a bearer token on every attempt, so
    /// rotation-capable providers always contribute a fresh value. This
    /// constructor is infallible given a built configuration.
    #[must_use]
    pub fn new(config: ClientConfig, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            executor: RequestExecutor::new(&config, token_provider),
        }
    }

    /// Executes a query operation.
    ///
    /// `estimated_cost` is the caller's hint for the pre-flight capacity
    /// check; when absent, the configured query default applies. The
    /// server's billed cost always corrects the estimate afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] for every non-success path; see
    /// [`RequestExecutor::send`] for the classification. In particular an
    /// operation string that begins with the `mutation` keyword is rejected
    /// with [`ClientError::InvalidOperation`] before any network call.
    pub async fn execute_query(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        estimated_cost: Option<u32>,
    ) -> Result<QueryResult, ClientError> {
        let request = Self::build(GraphqlRequest::query(query), variables, estimated_cost)?;
        self.executor.send(&request).await
    }

    /// Executes a mutation operation.
    ///
    /// The operation string must lexically begin with the `mutation`
    /// keyword; a read accidentally routed through this path would
    /// otherwise inherit the mutation cost default.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] for every non-success path; see
    /// [`RequestExecutor::send`] for the classification.
    pub async fn execute_mutation(
        &self,
        mutation: &str,
        variables: Option<serde_json::Value>,
        estimated_cost: Option<u32>,
    ) -> Result<QueryResult, ClientError> {
        let request = Self::build(GraphqlRequest::mutation(mutation), variables, estimated_cost)?;
        self.executor.send(&request).await
    }

    /// Executes a pre-built request.
    ///
    /// Use this for per-request attempt, deadline, or header overrides that
    /// the convenience methods do not expose.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] for every non-success path; see
    /// [`RequestExecutor::send`] for the classification.
    pub async fn execute(&self, request: &GraphqlRequest) -> Result<QueryResult, ClientError> {
        self.executor.send(request).await
    }

    /// Returns the current cost budget, for health reporting.
    #[must_use]
    pub fn budget_snapshot(&self) -> BudgetSnapshot {
        self.executor.budget_snapshot()
    }

    /// Returns the circuit breaker's current state, for health reporting.
    #[must_use]
    pub fn breaker_state(&self) -> BreakerState {
        self.executor.breaker_state()
    }

    fn build(
        builder: crate::clients::request::GraphqlRequestBuilder,
        variables: Option<serde_json::Value>,
        estimated_cost: Option<u32>,
    ) -> Result<GraphqlRequest, ClientError> {
        let builder = match variables {
            Some(variables) => builder.variables(variables),
            None => builder,
        };
        let builder = match estimated_cost {
            Some(cost) => builder.estimated_cost(cost),
            None => builder,
        };
        Ok(builder.build()?)
    }
}

//! Request execution with retry, cost budgeting, and failure isolation.
//!
//! This module provides the [`RequestExecutor`] type, which owns the HTTP
//! transport and orchestrates the cost tracker and circuit breaker around
//! every attempt of a request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenProvider;
use crate::clients::errors::{
    CircuitOpenError, ClientError, MaxRetriesExceededError, OperationError, RequestTimeoutError,
    UpstreamStatusError,
};
use crate::clients::request::{GraphqlRequest, OperationKind};
use crate::clients::response::{
    parse_retry_after, request_id, GraphqlResponse, QueryResult, DEFAULT_RETRY_AFTER,
};
use crate::config::ClientConfig;
use crate::throttle::{BudgetSnapshot, BreakerState, CircuitBreaker, CostTracker};

/// Client version from Cargo.toml.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Executes requests against the endpoint with retry and throttling.
///
/// The executor owns the HTTP transport and the two shared throttle
/// components. Around every attempt it:
///
/// 1. Gates on the circuit breaker (fail fast while the upstream is down)
/// 2. Reserves the estimated cost from the budget, waiting for capacity
/// 3. Issues the HTTP POST with a fresh bearer token
/// 4. Classifies the outcome, settling or refunding the reservation
///
/// Rate-limit responses honor `Retry-After`; server faults back off
/// exponentially; operation-level errors surface immediately.
///
/// # Thread Safety
///
/// `RequestExecutor` is `Send + Sync`, making it safe to share across
/// async tasks.
pub struct RequestExecutor {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// The endpoint URL every request is POSTed to.
    endpoint: String,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
    /// Source of bearer tokens, asked on every attempt.
    token_provider: Arc<dyn TokenProvider>,
    /// Leaky-bucket budget for the server's cost points.
    cost_tracker: CostTracker,
    /// Failure isolator shared by all requests through this executor.
    breaker: CircuitBreaker,
    max_attempts: u32,
    backoff_base: Duration,
    max_backoff: Duration,
    request_timeout: Option<Duration>,
    default_query_cost: u32,
    default_mutation_cost: u32,
}

// Verify RequestExecutor is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RequestExecutor>();
};

// The token provider is a trait object without a Debug bound
impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("endpoint", &self.endpoint)
            .field("max_attempts", &self.max_attempts)
            .field("cost_tracker", &self.cost_tracker)
            .field("breaker", &self.breaker)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Creates a new executor for the configured endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This
    /// should only happen in extremely unusual circumstances (e.g., TLS
    /// initialization failure).
    #[must_use]
    pub fn new(config: &ClientConfig, token_provider: Arc<dyn TokenProvider>) -> Self {
        // Build User-Agent header
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}throttleql v{CLIENT_VERSION} | Rust {rust_version}");

        // Build default headers
        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        // Create reqwest client
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: config.endpoint().as_ref().to_string(),
            default_headers,
            token_provider,
            cost_tracker: CostTracker::new(
                config.bucket_capacity(),
                config.restore_rate(),
                config.max_capacity_wait(),
            ),
            breaker: CircuitBreaker::new(config.failure_threshold(), config.recovery_timeout()),
            max_attempts: config.max_attempts(),
            backoff_base: config.backoff_base(),
            max_backoff: config.max_backoff(),
            request_timeout: config.request_timeout(),
            default_query_cost: config.default_query_cost(),
            default_mutation_cost: config.default_mutation_cost(),
        }
    }

    /// Returns the endpoint URL this executor posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the default headers for this executor.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the current cost budget, refreshed to now.
    #[must_use]
    pub fn budget_snapshot(&self) -> BudgetSnapshot {
        self.cost_tracker.snapshot()
    }

    /// Returns the circuit breaker's current state.
    #[must_use]
    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Executes a request, retrying transient failures up to the attempt
    /// budget.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if:
    /// - the request fails validation (`InvalidOperation`)
    /// - the circuit breaker is open (`CircuitOpen`)
    /// - capacity cannot be reserved within the wait bound (`CapacityTimeout`)
    /// - a transient failure persists through every attempt (`MaxRetries`,
    ///   or `Network` for single-attempt requests)
    /// - the upstream answers a fatal status (`UpstreamStatus`)
    /// - the operation itself is rejected (`Operation`)
    /// - the request deadline expires (`Timeout`)
    pub async fn send(&self, request: &GraphqlRequest) -> Result<QueryResult, ClientError> {
        request.verify()?;

        let max_attempts = request.max_attempts.unwrap_or(self.max_attempts).max(1);
        let estimated_cost = request.estimated_cost.unwrap_or(match request.kind {
            OperationKind::Query => self.default_query_cost,
            OperationKind::Mutation => self.default_mutation_cost,
        });

        let attempts_started = AtomicU32::new(0);
        let attempts_fut = self.run_attempts(request, estimated_cost, max_attempts, &attempts_started);

        match request.timeout.or(self.request_timeout) {
            Some(deadline) => {
                // Deadline expiry cancels the attempt loop cooperatively:
                // any live reservation refunds itself on drop, and the
                // breaker is left untouched (a caller-imposed timeout says
                // nothing about upstream health).
                (tokio::time::timeout(deadline, attempts_fut).await).map_or_else(
                    |_| {
                        Err(ClientError::Timeout(RequestTimeoutError {
                            attempts: attempts_started.load(Ordering::Relaxed),
                        }))
                    },
                    |result| result,
                )
            }
            None => attempts_fut.await,
        }
    }

    /// The attempt loop: gate, reserve, POST, classify.
    async fn run_attempts(
        &self,
        request: &GraphqlRequest,
        estimated_cost: u32,
        max_attempts: u32,
        attempts_started: &AtomicU32,
    ) -> Result<QueryResult, ClientError> {
        let body = serde_json::json!({
            "query": request.operation,
            "variables": request.variables,
        });

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            attempts_started.store(attempt, Ordering::Relaxed);

            // Fail fast while the upstream is considered down
            if !self.breaker.can_execute() {
                return Err(ClientError::CircuitOpen(CircuitOpenError {
                    retry_in: self.breaker.retry_in(),
                }));
            }

            // Claim the estimate before touching the network; the
            // reservation refunds itself unless settled below
            let reservation = self.cost_tracker.wait_for_capacity(estimated_cost).await?;

            // Build and send the POST, with a fresh token per attempt
            let mut req_builder = self.client.post(&self.endpoint);
            for (key, value) in &self.default_headers {
                req_builder = req_builder.header(key, value);
            }
            req_builder = req_builder.header(
                "Authorization",
                format!("Bearer {}", self.token_provider.bearer_token().as_ref()),
            );
            if let Some(extra) = &request.extra_headers {
                for (key, value) in extra {
                    req_builder = req_builder.header(key, value);
                }
            }

            let res = match req_builder.json(&body).send().await {
                Ok(res) => res,
                Err(err) => {
                    drop(reservation);
                    if attempt >= max_attempts {
                        self.breaker.record_failure();
                        if max_attempts == 1 {
                            return Err(ClientError::Network(err));
                        }
                        return Err(ClientError::MaxRetries(MaxRetriesExceededError {
                            code: None,
                            attempts: attempt,
                            message: err.to_string(),
                        }));
                    }
                    let delay = self.backoff_delay(attempt);
                    tracing::debug!(
                        "Transport error on attempt {attempt}/{max_attempts}, retrying in {delay:?}: {err}"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            let code = res.status().as_u16();

            // Rate limited: honor Retry-After, do not count toward the
            // breaker unless the attempt budget is exhausted
            if code == 429 {
                drop(reservation);
                let retry_after = parse_retry_after(res.headers()).unwrap_or(DEFAULT_RETRY_AFTER);
                if attempt >= max_attempts {
                    self.breaker.record_failure();
                    let body_text = res.text().await.unwrap_or_default();
                    tracing::warn!("Rate limited on final attempt {attempt}/{max_attempts}");
                    return Err(ClientError::MaxRetries(MaxRetriesExceededError {
                        code: Some(429),
                        attempts: attempt,
                        message: Self::serialize_error(429, &body_text),
                    }));
                }
                tracing::debug!(
                    "Rate limited on attempt {attempt}/{max_attempts}, retrying in {retry_after}s"
                );
                tokio::time::sleep(Duration::from_secs_f64(retry_after)).await;
                continue;
            }

            // Server fault: exponential backoff
            if code >= 500 {
                drop(reservation);
                if attempt >= max_attempts {
                    self.breaker.record_failure();
                    let body_text = res.text().await.unwrap_or_default();
                    tracing::warn!(
                        "Upstream fault {code} persisted through {attempt} attempt(s)"
                    );
                    return Err(ClientError::MaxRetries(MaxRetriesExceededError {
                        code: Some(code),
                        attempts: attempt,
                        message: Self::serialize_error(code, &body_text),
                    }));
                }
                let delay = self.backoff_delay(attempt);
                tracing::debug!(
                    "Upstream fault {code} on attempt {attempt}/{max_attempts}, retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            // Remaining 4xx statuses indicate a caller-side problem: fatal,
            // not retried, breaker untouched
            if code >= 400 {
                drop(reservation);
                let reference = request_id(res.headers());
                let body_text = res.text().await.unwrap_or_default();
                return Err(ClientError::UpstreamStatus(UpstreamStatusError {
                    code,
                    message: Self::serialize_error(code, &body_text),
                    request_id: reference,
                }));
            }

            // 2xx: decode the envelope once at the transport boundary
            let body_text = res.text().await.unwrap_or_default();
            let response: GraphqlResponse = match serde_json::from_str(&body_text) {
                Ok(response) => response,
                Err(err) => {
                    drop(reservation);
                    return Err(ClientError::UpstreamStatus(UpstreamStatusError {
                        code,
                        message: format!("Failed to decode response envelope: {err}"),
                        request_id: None,
                    }));
                }
            };

            // Top-level errors with no data: the operation itself is
            // invalid, so retrying is never useful. Errored operations can
            // still be billed, so settle when the server reported a cost.
            if response.is_operation_failure() {
                match response.cost() {
                    Some(cost) => {
                        reservation.settle(cost.billed(), cost.throttle_status.as_ref());
                    }
                    None => drop(reservation),
                }
                self.breaker.record_failure();
                let errors = response.errors.unwrap_or_default();
                return Err(ClientError::Operation(OperationError {
                    message: serde_json::json!({ "errors": &errors }).to_string(),
                    errors,
                    attempts: attempt,
                }));
            }

            // Success: replace the estimate with the billed cost and adopt
            // the server's budget report
            let cost = response.cost().copied();
            match &cost {
                Some(cost) => reservation.settle(cost.billed(), cost.throttle_status.as_ref()),
                None => reservation.settle(estimated_cost, None),
            }
            self.breaker.record_success();

            return Ok(QueryResult {
                data: response.data.unwrap_or(serde_json::Value::Null),
                errors: response.errors.unwrap_or_default(),
                cost,
            });
        }
    }

    /// Calculates the backoff delay for a failed attempt, capped.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2_u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }

    /// Serializes an error response body into a JSON message.
    fn serialize_error(code: u16, body_text: &str) -> String {
        if body_text.is_empty() {
            return serde_json::json!({ "errors": format!("HTTP {code}") }).to_string();
        }

        serde_json::from_str::<serde_json::Value>(body_text).map_or_else(
            // Non-JSON bodies (proxy error pages) are carried raw
            |_| serde_json::json!({ "raw_body": body_text }).to_string(),
            |value| {
                let mut error_body = serde_json::Map::new();
                for field in ["errors", "error", "error_description"] {
                    if let Some(entry) = value.get(field) {
                        error_body.insert(field.to_string(), entry.clone());
                    }
                }
                if error_body.is_empty() {
                    error_body.insert(
                        "errors".to_string(),
                        serde_json::json!(format!("HTTP {code}")),
                    );
                }
                serde_json::to_string(&error_body).unwrap_or_else(|_| "{}".to_string())
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use crate::config::{AccessToken, EndpointUrl};

    fn test_config() -> ClientConfig {
        ClientConfig::builder()
            .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
            .build()
            .unwrap()
    }

    fn test_executor(config: &ClientConfig) -> RequestExecutor {
        let provider = Arc::new(StaticToken::new(AccessToken::new("test-token").unwrap()));
        RequestExecutor::new(config, provider)
    }

    #[test]
    fn test_executor_construction_captures_endpoint() {
        let executor = test_executor(&test_config());
        assert_eq!(executor.endpoint(), "https://api.example.com/graphql");
    }

    #[test]
    fn test_user_agent_header_format() {
        let executor = test_executor(&test_config());
        let user_agent = executor.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.contains("throttleql v"));
        assert!(user_agent.contains("Rust"));
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let config = ClientConfig::builder()
            .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
            .user_agent_prefix("MyApp/1.0")
            .build()
            .unwrap();
        let executor = test_executor(&config);

        let user_agent = executor.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("MyApp/1.0 | "));
        assert!(user_agent.contains("throttleql"));
    }

    #[test]
    fn test_accept_header_is_json() {
        let executor = test_executor(&test_config());
        assert_eq!(
            executor.default_headers().get("Accept"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        let config = ClientConfig::builder()
            .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
            .backoff_base(Duration::from_secs(1))
            .max_backoff(Duration::from_secs(5))
            .build()
            .unwrap();
        let executor = test_executor(&config);

        assert_eq!(executor.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(executor.backoff_delay(2), Duration::from_secs(4));
        // Capped at max_backoff from the third retry on
        assert_eq!(executor.backoff_delay(3), Duration::from_secs(5));
        assert_eq!(executor.backoff_delay(30), Duration::from_secs(5));
    }

    #[test]
    fn test_fresh_executor_reports_full_budget_and_closed_breaker() {
        let executor = test_executor(&test_config());

        let budget = executor.budget_snapshot();
        assert!((budget.capacity - 1000.0).abs() < f64::EPSILON);
        assert!((budget.currently_available - 1000.0).abs() < 1e-6);
        assert_eq!(executor.breaker_state(), BreakerState::Closed);
    }

    #[test]
    fn test_serialize_error_extracts_known_fields() {
        let message =
            RequestExecutor::serialize_error(500, r#"{"errors":"boom","ignored":"field"}"#);
        assert_eq!(message, r#"{"errors":"boom"}"#);
    }

    #[test]
    fn test_serialize_error_wraps_non_json_bodies() {
        let message = RequestExecutor::serialize_error(502, "<html>Bad Gateway</html>");
        assert!(message.contains("raw_body"));
        assert!(message.contains("Bad Gateway"));
    }

    #[test]
    fn test_serialize_error_falls_back_to_status() {
        let message = RequestExecutor::serialize_error(503, "");
        assert!(message.contains("HTTP 503"));

        let message = RequestExecutor::serialize_error(500, r#"{"unrelated":true}"#);
        assert!(message.contains("HTTP 500"));
    }
}

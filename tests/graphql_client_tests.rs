//! Integration tests for the GraphQL client facade.
//!
//! These tests verify client construction, the operation-shape guard,
//! request building, and the error surface.

use std::sync::Arc;
use std::time::Duration;

use throttleql::{
    AccessToken, BreakerState, ClientConfig, ClientError, EndpointUrl, GraphqlClient,
    GraphqlRequest, InvalidOperationError, OperationKind, StaticToken,
};

/// Creates a test client pointed at an unresolvable endpoint.
fn create_test_client() -> GraphqlClient {
    let config = ClientConfig::builder()
        .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
        .build()
        .unwrap();
    let token = StaticToken::new(AccessToken::new("test-token").unwrap());
    GraphqlClient::new(config, Arc::new(token))
}

// ============================================================================
// GraphqlClient Construction Tests
// ============================================================================

#[test]
fn test_client_constructor_is_infallible() {
    // This compiles because new() returns Self, not Result
    let _client: GraphqlClient = create_test_client();
}

#[test]
fn test_client_is_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
}

#[test]
fn test_fresh_client_reports_configured_budget() {
    let config = ClientConfig::builder()
        .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
        .bucket_capacity(2000.0)
        .restore_rate(100.0)
        .build()
        .unwrap();
    let token = StaticToken::new(AccessToken::new("test-token").unwrap());
    let client = GraphqlClient::new(config, Arc::new(token));

    let budget = client.budget_snapshot();
    assert!((budget.capacity - 2000.0).abs() < f64::EPSILON);
    assert!((budget.currently_available - 2000.0).abs() < 1e-6);
    assert!((budget.restore_rate - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_fresh_client_breaker_is_closed() {
    let client = create_test_client();
    assert_eq!(client.breaker_state(), BreakerState::Closed);
}

// ============================================================================
// Operation Shape Guard Tests
// ============================================================================

#[tokio::test]
async fn test_mutation_path_rejects_query_strings() {
    let client = create_test_client();

    let result = client
        .execute_mutation("query { shop { name } }", None, None)
        .await;

    assert!(matches!(
        result,
        Err(ClientError::InvalidOperation(
            InvalidOperationError::ExpectedMutation
        ))
    ));
}

#[tokio::test]
async fn test_query_path_rejects_mutation_strings() {
    let client = create_test_client();

    let result = client
        .execute_query("mutation { orderCreate { id } }", None, None)
        .await;

    assert!(matches!(
        result,
        Err(ClientError::InvalidOperation(
            InvalidOperationError::UnexpectedMutation
        ))
    ));
}

#[tokio::test]
async fn test_empty_operation_is_rejected() {
    let client = create_test_client();
    let result = client.execute_query("  \n ", None, None).await;

    assert!(matches!(
        result,
        Err(ClientError::InvalidOperation(InvalidOperationError::Empty))
    ));
}

// ============================================================================
// Request Builder Tests
// ============================================================================

#[test]
fn test_request_builder_carries_overrides() {
    let request = GraphqlRequest::query("query { shop { name } }")
        .variables(serde_json::json!({ "first": 10 }))
        .estimated_cost(12)
        .max_attempts(5)
        .timeout(Duration::from_secs(20))
        .header("X-Correlation-Id", "abc-123")
        .build()
        .unwrap();

    assert_eq!(request.kind, OperationKind::Query);
    assert_eq!(request.estimated_cost, Some(12));
    assert_eq!(request.max_attempts, Some(5));
    assert_eq!(request.timeout, Some(Duration::from_secs(20)));
    assert_eq!(
        request.extra_headers.unwrap().get("X-Correlation-Id"),
        Some(&"abc-123".to_string())
    );
}

#[test]
fn test_request_builder_enforces_mutation_shape() {
    let result = GraphqlRequest::mutation("query { shop { name } }").build();
    assert!(matches!(
        result,
        Err(InvalidOperationError::ExpectedMutation)
    ));
}

// ============================================================================
// Error Type Tests
// ============================================================================

#[test]
fn test_client_error_preserves_attempt_counts() {
    use throttleql::MaxRetriesExceededError;

    let error: ClientError = MaxRetriesExceededError {
        code: Some(500),
        attempts: 3,
        message: r#"{"errors":"Internal Server Error"}"#.to_string(),
    }
    .into();

    let message = error.to_string();
    assert!(message.contains("Exceeded maximum attempt count of 3"));
    assert!(message.contains("Internal Server Error"));
}

#[test]
fn test_client_error_carries_operation_errors() {
    use throttleql::{OperationError, ResponseError};

    let error: ClientError = OperationError {
        message: r#"{"errors":[{"message":"Field 'shoop' doesn't exist"}]}"#.to_string(),
        errors: vec![ResponseError {
            message: "Field 'shoop' doesn't exist".to_string(),
            path: None,
            extensions: None,
        }],
        attempts: 1,
    }
    .into();

    match error {
        ClientError::Operation(e) => {
            assert_eq!(e.attempts, 1);
            assert_eq!(e.errors.len(), 1);
            assert!(e.errors[0].message.contains("shoop"));
        }
        other => panic!("Expected Operation error, got: {other}"),
    }
}

#[test]
fn test_circuit_open_error_reports_probe_window() {
    use throttleql::CircuitOpenError;

    let error = CircuitOpenError {
        retry_in: Some(Duration::from_secs(12)),
    };
    assert_eq!(error.retry_in, Some(Duration::from_secs(12)));

    let error: ClientError = error.into();
    assert!(error.to_string().contains("Circuit breaker is open"));
}

#[test]
fn test_all_error_classes_implement_std_error() {
    use throttleql::{CapacityTimeoutError, RequestTimeoutError, UpstreamStatusError};

    let errors: Vec<Box<dyn std::error::Error>> = vec![
        Box::new(UpstreamStatusError {
            code: 401,
            message: r#"{"errors":"Unauthorized"}"#.to_string(),
            request_id: None,
        }),
        Box::new(RequestTimeoutError { attempts: 2 }),
        Box::new(CapacityTimeoutError {
            requested_cost: 500,
            capacity: 100.0,
        }),
        Box::new(InvalidOperationError::Empty),
    ];

    for error in &errors {
        assert!(!error.to_string().is_empty());
    }
}

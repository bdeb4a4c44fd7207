//! Configuration types for the GraphQL client.
//!
//! This module provides the core configuration types used to initialize
//! a [`GraphqlClient`](crate::clients::graphql::GraphqlClient) for a single
//! cost-throttled GraphQL endpoint.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ClientConfig`]: The main configuration struct holding all client settings
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`EndpointUrl`]: A validated GraphQL endpoint URL
//! - [`AccessToken`]: A validated bearer token with masked debug output
//!
//! # Example
//!
//! ```rust
//! use throttleql::{ClientConfig, EndpointUrl};
//!
//! let config = ClientConfig::builder()
//!     .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
//!     .bucket_capacity(1000.0)
//!     .restore_rate(50.0)
//!     .build()
//!     .unwrap();
//! ```

mod newtypes;

pub use newtypes::{AccessToken, EndpointUrl};

use std::time::Duration;

use crate::error::ConfigError;

/// Default cost-point capacity of the leaky bucket.
pub const DEFAULT_BUCKET_CAPACITY: f64 = 1000.0;

/// Default bucket restore rate in points per second.
pub const DEFAULT_RESTORE_RATE: f64 = 50.0;

/// Default consecutive-failure count that opens the circuit breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default cooldown before the breaker allows a recovery probe.
pub const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of attempts per logical call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default upper bound on time spent waiting for bucket capacity.
pub const DEFAULT_MAX_CAPACITY_WAIT: Duration = Duration::from_secs(60);

/// Default unit for the exponential retry backoff (`base * 2^attempt`).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Default cap on a single backoff delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Default cost estimate for queries when the caller supplies no hint.
pub const DEFAULT_QUERY_COST: u32 = 1;

/// Default cost estimate for mutations when the caller supplies no hint.
pub const DEFAULT_MUTATION_COST: u32 = 10;

/// Configuration for the GraphQL client.
///
/// This struct holds all configuration needed for client operations: the
/// endpoint, the cost-budget parameters used until the server reports its
/// own, circuit breaker tuning, and the retry policy.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use throttleql::{ClientConfig, EndpointUrl};
///
/// let config = ClientConfig::builder()
///     .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
///     .failure_threshold(5)
///     .recovery_timeout(Duration::from_secs(30))
///     .max_attempts(3)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.max_attempts(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    endpoint: EndpointUrl,
    bucket_capacity: f64,
    restore_rate: f64,
    failure_threshold: u32,
    recovery_timeout: Duration,
    max_attempts: u32,
    max_capacity_wait: Duration,
    backoff_base: Duration,
    max_backoff: Duration,
    default_query_cost: u32,
    default_mutation_cost: u32,
    request_timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use throttleql::{ClientConfig, EndpointUrl};
    ///
    /// let config = ClientConfig::builder()
    ///     .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the GraphQL endpoint URL.
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointUrl {
        &self.endpoint
    }

    /// Returns the initial cost-point capacity of the bucket.
    ///
    /// This is the local assumption used until the server reports its
    /// authoritative throttle status.
    #[must_use]
    pub const fn bucket_capacity(&self) -> f64 {
        self.bucket_capacity
    }

    /// Returns the initial restore rate in points per second.
    #[must_use]
    pub const fn restore_rate(&self) -> f64 {
        self.restore_rate
    }

    /// Returns the consecutive-failure count that opens the breaker.
    #[must_use]
    pub const fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Returns the cooldown before the breaker allows a recovery probe.
    #[must_use]
    pub const fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    /// Returns the number of attempts made per logical call.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the upper bound on time spent waiting for bucket capacity.
    #[must_use]
    pub const fn max_capacity_wait(&self) -> Duration {
        self.max_capacity_wait
    }

    /// Returns the unit for the exponential retry backoff.
    #[must_use]
    pub const fn backoff_base(&self) -> Duration {
        self.backoff_base
    }

    /// Returns the cap on a single backoff delay.
    #[must_use]
    pub const fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Returns the cost estimate used for queries without a caller hint.
    #[must_use]
    pub const fn default_query_cost(&self) -> u32 {
        self.default_query_cost
    }

    /// Returns the cost estimate used for mutations without a caller hint.
    #[must_use]
    pub const fn default_mutation_cost(&self) -> u32 {
        self.default_mutation_cost
    }

    /// Returns the per-call deadline, if configured.
    ///
    /// When set, a whole logical call (all attempts, waits, and backoffs)
    /// must finish within this duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// This builder provides a fluent API for configuring the client. The only
/// required field is `endpoint`; everything else has documented defaults.
///
/// # Defaults
///
/// - `bucket_capacity`: 1000 points
/// - `restore_rate`: 50 points/second
/// - `failure_threshold`: 5 consecutive failures
/// - `recovery_timeout`: 30 seconds
/// - `max_attempts`: 3
/// - `max_capacity_wait`: 60 seconds
/// - `backoff_base`: 1 second
/// - `max_backoff`: 30 seconds
/// - `default_query_cost`: 1, `default_mutation_cost`: 10
/// - `request_timeout`: none
/// - `user_agent_prefix`: none
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use throttleql::{ClientConfig, EndpointUrl};
///
/// let config = ClientConfig::builder()
///     .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
///     .bucket_capacity(2000.0)
///     .restore_rate(100.0)
///     .request_timeout(Duration::from_secs(10))
///     .user_agent_prefix("MyApp/1.0")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    endpoint: Option<EndpointUrl>,
    bucket_capacity: Option<f64>,
    restore_rate: Option<f64>,
    failure_threshold: Option<u32>,
    recovery_timeout: Option<Duration>,
    max_attempts: Option<u32>,
    max_capacity_wait: Option<Duration>,
    backoff_base: Option<Duration>,
    max_backoff: Option<Duration>,
    default_query_cost: Option<u32>,
    default_mutation_cost: Option<u32>,
    request_timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the GraphQL endpoint URL (required).
    #[must_use]
    pub fn endpoint(mut self, endpoint: EndpointUrl) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the initial cost-point capacity of the bucket.
    #[must_use]
    pub const fn bucket_capacity(mut self, capacity: f64) -> Self {
        self.bucket_capacity = Some(capacity);
        self
    }

    /// Sets the initial restore rate in points per second.
    #[must_use]
    pub const fn restore_rate(mut self, rate: f64) -> Self {
        self.restore_rate = Some(rate);
        self
    }

    /// Sets the consecutive-failure count that opens the breaker.
    #[must_use]
    pub const fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = Some(threshold);
        self
    }

    /// Sets the cooldown before the breaker allows a recovery probe.
    #[must_use]
    pub const fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = Some(timeout);
        self
    }

    /// Sets the number of attempts made per logical call.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the upper bound on time spent waiting for bucket capacity.
    ///
    /// A call whose accumulated capacity wait would exceed this bound fails
    /// with a capacity-timeout error instead of sleeping indefinitely.
    #[must_use]
    pub const fn max_capacity_wait(mut self, wait: Duration) -> Self {
        self.max_capacity_wait = Some(wait);
        self
    }

    /// Sets the unit for the exponential retry backoff.
    #[must_use]
    pub const fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = Some(base);
        self
    }

    /// Sets the cap on a single backoff delay.
    #[must_use]
    pub const fn max_backoff(mut self, cap: Duration) -> Self {
        self.max_backoff = Some(cap);
        self
    }

    /// Sets the cost estimate used for queries without a caller hint.
    #[must_use]
    pub const fn default_query_cost(mut self, cost: u32) -> Self {
        self.default_query_cost = Some(cost);
        self
    }

    /// Sets the cost estimate used for mutations without a caller hint.
    #[must_use]
    pub const fn default_mutation_cost(mut self, cost: u32) -> Self {
        self.default_mutation_cost = Some(cost);
        self
    }

    /// Sets the per-call deadline covering all attempts of a logical call.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`ClientConfig`], validating that required fields are set
    /// and tuning values are in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `endpoint` is not
    /// set, or [`ConfigError::InvalidSetting`] if a numeric setting is out
    /// of range (non-finite or non-positive capacity/rate, zero attempts or
    /// threshold).
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let endpoint = self
            .endpoint
            .ok_or(ConfigError::MissingRequiredField { field: "endpoint" })?;

        let bucket_capacity = self.bucket_capacity.unwrap_or(DEFAULT_BUCKET_CAPACITY);
        if !bucket_capacity.is_finite() || bucket_capacity <= 0.0 {
            return Err(ConfigError::InvalidSetting {
                field: "bucket_capacity",
                reason: "must be a finite number greater than zero",
            });
        }

        let restore_rate = self.restore_rate.unwrap_or(DEFAULT_RESTORE_RATE);
        if !restore_rate.is_finite() || restore_rate <= 0.0 {
            return Err(ConfigError::InvalidSetting {
                field: "restore_rate",
                reason: "must be a finite number greater than zero",
            });
        }

        let failure_threshold = self.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD);
        if failure_threshold == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "failure_threshold",
                reason: "must be at least 1",
            });
        }

        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "max_attempts",
                reason: "must be at least 1",
            });
        }

        Ok(ClientConfig {
            endpoint,
            bucket_capacity,
            restore_rate,
            failure_threshold,
            recovery_timeout: self.recovery_timeout.unwrap_or(DEFAULT_RECOVERY_TIMEOUT),
            max_attempts,
            max_capacity_wait: self.max_capacity_wait.unwrap_or(DEFAULT_MAX_CAPACITY_WAIT),
            backoff_base: self.backoff_base.unwrap_or(DEFAULT_BACKOFF_BASE),
            max_backoff: self.max_backoff.unwrap_or(DEFAULT_MAX_BACKOFF),
            default_query_cost: self.default_query_cost.unwrap_or(DEFAULT_QUERY_COST),
            default_mutation_cost: self
                .default_mutation_cost
                .unwrap_or(DEFAULT_MUTATION_COST),
            request_timeout: self.request_timeout,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}

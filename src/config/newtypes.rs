//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use std::fmt;

/// A validated GraphQL endpoint URL.
///
/// This newtype ensures the endpoint is an absolute `http` or `https` URL
/// with a non-empty host, and provides type safety to prevent accidental
/// misuse of raw strings.
///
/// # Example
///
/// ```rust
/// use throttleql::EndpointUrl;
///
/// let endpoint = EndpointUrl::new("https://api.example.com/graphql").unwrap();
/// assert_eq!(endpoint.as_ref(), "https://api.example.com/graphql");
///
/// // Plain http is accepted for local development and tests
/// assert!(EndpointUrl::new("http://127.0.0.1:8080/graphql").is_ok());
///
/// // Schemeless or empty values are rejected
/// assert!(EndpointUrl::new("api.example.com/graphql").is_err());
/// assert!(EndpointUrl::new("").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointUrl(String);

impl EndpointUrl {
    /// Creates a new validated endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpointUrl`] if the URL is empty,
    /// has no `http`/`https` scheme, has an empty host, or contains
    /// whitespace.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().to_string();

        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"));

        match rest {
            Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => {
                Ok(Self(url))
            }
            _ => Err(ConfigError::InvalidEndpointUrl { url }),
        }
    }
}

impl AsRef<str> for EndpointUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated bearer access token.
///
/// This newtype ensures the token is non-empty and masks its value in debug
/// output to prevent accidental exposure in logs.
///
/// # Security
///
/// The `Debug` implementation masks the token value, displaying only
/// `AccessToken(*****)` instead of the actual token.
///
/// # Example
///
/// ```rust
/// use throttleql::AccessToken;
///
/// let token = AccessToken::new("my-token").unwrap();
/// assert_eq!(token.as_ref(), "my-token");
/// assert_eq!(format!("{:?}", token), "AccessToken(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a new validated access token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAccessToken`] if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ConfigError::EmptyAccessToken);
        }
        Ok(Self(token))
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

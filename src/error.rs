//! Error types for client configuration.
//!
//! This module contains error types used for configuration and validation
//! errors. Errors surfaced while executing requests live in
//! [`ClientError`](crate::clients::ClientError) and its variants.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and
//! actionable.
//!
//! # Example
//!
//! ```rust
//! use throttleql::{AccessToken, ConfigError};
//!
//! let result = AccessToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyAccessToken)));
//! ```

use thiserror::Error;

/// Errors that can occur during client configuration.
///
/// This enum represents all possible errors that can occur when creating
/// or validating configuration types. Each variant provides a clear,
/// actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Access token cannot be empty.
    #[error("Access token cannot be empty. Please provide a valid bearer token.")]
    EmptyAccessToken,

    /// Endpoint URL is invalid.
    #[error("Invalid endpoint URL '{url}'. Please provide an absolute URL with scheme (e.g., 'https://api.example.com/graphql').")]
    InvalidEndpointUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A throttle or retry tuning value is out of range.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidSetting {
        /// The name of the offending setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_access_token_error_message() {
        let error = ConfigError::EmptyAccessToken;
        let message = error.to_string();
        assert!(message.contains("Access token cannot be empty"));
        assert!(message.contains("valid bearer token"));
    }

    #[test]
    fn test_invalid_endpoint_url_error_message() {
        let error = ConfigError::InvalidEndpointUrl {
            url: "not a url".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("not a url"));
        assert!(message.contains("absolute URL"));
    }

    #[test]
    fn test_invalid_setting_error_message() {
        let error = ConfigError::InvalidSetting {
            field: "restore_rate",
            reason: "must be greater than zero",
        };
        let message = error.to_string();
        assert!(message.contains("restore_rate"));
        assert!(message.contains("greater than zero"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField { field: "endpoint" };
        let message = error.to_string();
        assert!(message.contains("endpoint"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyAccessToken;
        let _: &dyn std::error::Error = &error;
    }
}

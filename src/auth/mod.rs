//! Token provision for authenticated GraphQL requests.
//!
//! The client never fetches or refreshes credentials itself. A ready-to-use
//! bearer token is supplied on demand through the [`TokenProvider`] trait,
//! so secret storage, caching, and rotation stay outside this crate.
//!
//! # Example
//!
//! ```rust
//! use throttleql::{AccessToken, StaticToken, TokenProvider};
//!
//! let provider = StaticToken::new(AccessToken::new("my-token").unwrap());
//! assert_eq!(provider.bearer_token().as_ref(), "my-token");
//! ```

use crate::config::AccessToken;

/// A source of bearer tokens for outgoing requests.
///
/// Implementations must be cheap to call: the executor asks for a token on
/// every attempt so that rotation-capable providers always contribute a
/// fresh value. Blocking work (network fetches, disk reads) belongs in the
/// provider's own caching layer, not in `bearer_token`.
pub trait TokenProvider: Send + Sync {
    /// Returns the bearer token to use for the next request.
    fn bearer_token(&self) -> AccessToken;
}

/// The trivial [`TokenProvider`]: a single fixed token.
///
/// Suitable for long-lived app tokens and for tests. Anything with an
/// expiry needs a provider that refreshes behind this seam.
#[derive(Clone, Debug)]
pub struct StaticToken {
    token: AccessToken,
}

impl StaticToken {
    /// Creates a provider that always returns the given token.
    #[must_use]
    pub const fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> AccessToken {
        self.token.clone()
    }
}

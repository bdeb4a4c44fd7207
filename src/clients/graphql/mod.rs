//! GraphQL client facade for the cost-throttled endpoint.
//!
//! This module provides the high-level [`GraphqlClient`] built on top of
//! the [`RequestExecutor`](crate::clients::RequestExecutor). The facade
//! validates operation shape, applies per-kind cost-estimate defaults, and
//! exposes the budget and breaker introspection accessors.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use throttleql::{AccessToken, ClientConfig, EndpointUrl, GraphqlClient, StaticToken};
//!
//! let config = ClientConfig::builder()
//!     .endpoint(EndpointUrl::new("https://api.example.com/graphql").unwrap())
//!     .build()
//!     .unwrap();
//! let token = StaticToken::new(AccessToken::new("my-token").unwrap());
//! let client = GraphqlClient::new(config, Arc::new(token));
//!
//! let result = client
//!     .execute_query("query { shop { name } }", None, None)
//!     .await?;
//! println!("Shop name: {}", result.data["shop"]["name"]);
//!
//! // Partial errors may accompany data
//! for error in &result.errors {
//!     println!("Warning: {}", error.message);
//! }
//! ```
//!
//! # Response Structure
//!
//! Successful calls return a [`QueryResult`](crate::clients::QueryResult)
//! with these fields:
//!
//! - `data`: the operation's result data
//! - `errors`: partial errors reported alongside the data
//! - `cost`: the server's cost accounting for the operation
//!
//! A response with top-level errors and no data is surfaced as
//! [`ClientError::Operation`](crate::clients::ClientError::Operation)
//! instead, since retrying a rejected operation is never useful.

mod client;

pub use client::GraphqlClient;

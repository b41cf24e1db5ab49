//! Gateway to the hosted backend.
//!
//! The backend exposes two surfaces over HTTPS:
//!
//! - a row-level data API (`/rest/v1/{table}`) with filter, order and
//!   return-representation options, and
//! - an identity API (`/auth/v1/...`) for password sign-in, sign-up,
//!   metadata updates, sign-out and token refresh.
//!
//! Nothing is cached here. Every call goes to the network and every result
//! is a `Result`; callers decide what a failure means for the user.
//!
//! The two traits below are the seam the services depend on. Production uses
//! [`BackendClient`]; tests use [`InMemoryBackend`]. The application state
//! carries either one as a [`Backend`].

mod client;
mod dispatch;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod query;

use std::future::Future;

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{AccessToken, AuthSession, Identity, UserMetadata};

pub use client::BackendClient;
pub use dispatch::Backend;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{InMemoryBackend, Operation};
pub use query::{Direction, Filter, Query};

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A single-row operation returned no rows.
    #[error("backend returned no rows for {0}")]
    EmptyResult(&'static str),

    /// The configured backend URL could not be joined with an endpoint path.
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
}

impl GatewayError {
    /// HTTP status reported by the backend, if it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The tables the storefront reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Products,
    Categories,
    CartItems,
    Orders,
    OrderItems,
    Profiles,
}

impl Table {
    /// Name of the table in the data API path.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::CartItems => "cart_items",
            Self::Orders => "orders",
            Self::OrderItems => "order_items",
            Self::Profiles => "profiles",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-level data access.
///
/// `token` is the signed-in user's access token. When absent the call is made
/// with the public anon key, so row-level security sees an anonymous caller.
pub trait Gateway: Send + Sync {
    /// Read the rows of `table` matching `query`.
    fn select<T>(
        &self,
        table: Table,
        query: &Query,
        token: Option<&AccessToken>,
    ) -> impl Future<Output = Result<Vec<T>, GatewayError>> + Send
    where
        T: DeserializeOwned + Send;

    /// Insert `rows` in one request and return the stored representation.
    fn insert<R, T>(
        &self,
        table: Table,
        rows: &[R],
        token: Option<&AccessToken>,
    ) -> impl Future<Output = Result<Vec<T>, GatewayError>> + Send
    where
        R: Serialize + Sync,
        T: DeserializeOwned + Send;

    /// Apply `patch` to every row matching `query`.
    fn update<P>(
        &self,
        table: Table,
        query: &Query,
        patch: &P,
        token: Option<&AccessToken>,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send
    where
        P: Serialize + Sync;

    /// Delete every row matching `query`.
    fn delete(
        &self,
        table: Table,
        query: &Query,
        token: Option<&AccessToken>,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Insert a single row and return its stored representation.
    fn insert_one<R, T>(
        &self,
        table: Table,
        row: &R,
        token: Option<&AccessToken>,
    ) -> impl Future<Output = Result<T, GatewayError>> + Send
    where
        R: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        async move {
            self.insert::<R, T>(table, std::slice::from_ref(row), token)
                .await?
                .into_iter()
                .next()
                .ok_or(GatewayError::EmptyResult(table.as_str()))
        }
    }
}

/// Result of a sign-up call.
///
/// `session` is present only when the backend auto-confirms new accounts.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub identity: Identity,
    pub session: Option<AuthSession>,
}

/// Identity-provider operations.
pub trait AuthGateway: Send + Sync {
    /// Exchange email and password for a session.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthSession, GatewayError>> + Send;

    /// Create an account. `metadata` is attached to the new identity.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> impl Future<Output = Result<SignUpOutcome, GatewayError>> + Send;

    /// Replace the metadata of the identity behind `token`.
    fn update_profile_metadata(
        &self,
        token: &AccessToken,
        metadata: &UserMetadata,
    ) -> impl Future<Output = Result<Identity, GatewayError>> + Send;

    /// Revoke the session behind `token`.
    fn sign_out(&self, token: &AccessToken)
    -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Look up the identity behind `token`.
    fn get_user(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<Identity, GatewayError>> + Send;

    /// Trade a refresh token for a new session.
    fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> impl Future<Output = Result<AuthSession, GatewayError>> + Send;
}

//! The backend the application state carries.

#[cfg(any(test, feature = "test-support"))]
use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(any(test, feature = "test-support"))]
use super::InMemoryBackend;
use super::{AuthGateway, BackendClient, Gateway, GatewayError, Query, SignUpOutcome, Table};
use crate::models::{AccessToken, AuthSession, Identity, UserMetadata};

/// The gateway behind every handler.
///
/// The gateway traits are not object-safe, so the choice of backend is an
/// enum rather than a trait object.
#[derive(Clone)]
pub enum Backend {
    Http(BackendClient),
    #[cfg(any(test, feature = "test-support"))]
    Memory(Arc<InMemoryBackend>),
}

impl From<BackendClient> for Backend {
    fn from(client: BackendClient) -> Self {
        Self::Http(client)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl From<Arc<InMemoryBackend>> for Backend {
    fn from(backend: Arc<InMemoryBackend>) -> Self {
        Self::Memory(backend)
    }
}

impl Gateway for Backend {
    async fn select<T>(
        &self,
        table: Table,
        query: &Query,
        token: Option<&AccessToken>,
    ) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            Self::Http(client) => client.select(table, query, token).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.select(table, query, token).await,
        }
    }

    async fn insert<R, T>(
        &self,
        table: Table,
        rows: &[R],
        token: Option<&AccessToken>,
    ) -> Result<Vec<T>, GatewayError>
    where
        R: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        match self {
            Self::Http(client) => client.insert(table, rows, token).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.insert(table, rows, token).await,
        }
    }

    async fn update<P>(
        &self,
        table: Table,
        query: &Query,
        patch: &P,
        token: Option<&AccessToken>,
    ) -> Result<(), GatewayError>
    where
        P: Serialize + Sync,
    {
        match self {
            Self::Http(client) => client.update(table, query, patch, token).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.update(table, query, patch, token).await,
        }
    }

    async fn delete(
        &self,
        table: Table,
        query: &Query,
        token: Option<&AccessToken>,
    ) -> Result<(), GatewayError> {
        match self {
            Self::Http(client) => client.delete(table, query, token).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.delete(table, query, token).await,
        }
    }
}

impl AuthGateway for Backend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, GatewayError> {
        match self {
            Self::Http(client) => client.sign_in_with_password(email, password).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.sign_in_with_password(email, password).await,
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<SignUpOutcome, GatewayError> {
        match self {
            Self::Http(client) => client.sign_up(email, password, metadata).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.sign_up(email, password, metadata).await,
        }
    }

    async fn update_profile_metadata(
        &self,
        token: &AccessToken,
        metadata: &UserMetadata,
    ) -> Result<Identity, GatewayError> {
        match self {
            Self::Http(client) => client.update_profile_metadata(token, metadata).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.update_profile_metadata(token, metadata).await,
        }
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError> {
        match self {
            Self::Http(client) => client.sign_out(token).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.sign_out(token).await,
        }
    }

    async fn get_user(&self, token: &AccessToken) -> Result<Identity, GatewayError> {
        match self {
            Self::Http(client) => client.get_user(token).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.get_user(token).await,
        }
    }

    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        match self {
            Self::Http(client) => client.refresh_session(refresh_token).await,
            #[cfg(any(test, feature = "test-support"))]
            Self::Memory(memory) => memory.refresh_session(refresh_token).await,
        }
    }
}

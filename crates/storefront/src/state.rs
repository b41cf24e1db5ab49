//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{Backend, BackendClient, GatewayError};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds configuration and the one backend;
/// per-user state lives in the cookie session, not here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Backend,
}

impl AppState {
    /// Create a new application state talking to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built from the
    /// configured URL.
    pub fn new(config: StorefrontConfig) -> Result<Self, GatewayError> {
        let client = BackendClient::new(&config.backend)?;
        Ok(Self::with_backend(config, client))
    }

    /// Create a new application state over an already built backend.
    ///
    /// `config.backend` is ignored.
    #[must_use]
    pub fn with_backend(config: StorefrontConfig, backend: impl Into<Backend>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend: backend.into(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the hosted backend.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }
}

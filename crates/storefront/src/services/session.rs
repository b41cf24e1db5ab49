//! Session/identity holder.
//!
//! A [`SessionHolder`] owns the auth state for one caller. It starts in
//! [`AuthState::Loading`] and publishes every transition on a `watch`
//! channel, so dependents (the cart holder, the access guard) can follow it.
//!
//! Sign-up never changes the state: new accounts must confirm their email
//! before they can sign in.

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

use stg_catalog_core::{FieldErrors, LoginInput, RegistrationInput};

use crate::backend::{AuthGateway, GatewayError};
use crate::models::{AuthSession, Identity, UserMetadata};

/// Who the caller is, as far as the storefront knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The stored session has not been checked yet.
    Loading,
    Anonymous,
    Authenticated(Identity),
}

impl AuthState {
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Loading | Self::Anonymous => None,
        }
    }
}

/// Errors from sign-in and sign-up.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The form failed validation; nothing was sent.
    #[error("invalid form: {} field(s)", .0.len())]
    Invalid(FieldErrors),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Holds the current session for one caller.
pub struct SessionHolder<'a, A> {
    auth: &'a A,
    state: watch::Sender<AuthState>,
    session: Option<AuthSession>,
}

impl<'a, A: AuthGateway> SessionHolder<'a, A> {
    #[must_use]
    pub fn new(auth: &'a A) -> Self {
        Self {
            auth,
            state: watch::Sender::new(AuthState::Loading),
            session: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receive every future state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The live session, when authenticated.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    /// Give up the live session.
    #[must_use]
    pub fn into_session(self) -> Option<AuthSession> {
        self.session
    }

    fn set(&mut self, session: Option<AuthSession>) {
        let next = session
            .as_ref()
            .map_or(AuthState::Anonymous, |s| {
                AuthState::Authenticated(s.identity.clone())
            });
        self.session = session;
        self.state.send_replace(next);
    }

    /// Resolve a stored session into a definite state.
    ///
    /// An unexpired session is trusted as-is. An expired one is refreshed
    /// once; if that fails the caller is anonymous.
    #[instrument(skip_all)]
    pub async fn restore(&mut self, stored: Option<AuthSession>) {
        let resolved = match stored {
            None => None,
            Some(session) if !session.is_expired(Utc::now()) => Some(session),
            Some(expired) => match self.auth.refresh_session(&expired.refresh_token).await {
                Ok(fresh) => {
                    tracing::debug!(user_id = %fresh.identity.id, "Session refreshed");
                    Some(fresh)
                }
                Err(e) => {
                    tracing::info!(error = %e, "Session refresh failed, signing out locally");
                    None
                }
            },
        };
        self.set(resolved);
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invalid` without calling the backend when the
    /// form fails validation, or the backend's error when it rejects the
    /// credentials. The state is unchanged on error.
    #[instrument(skip_all, fields(email = tracing::field::Empty))]
    pub async fn sign_in(&mut self, input: &LoginInput) -> Result<&AuthSession, SessionError> {
        let email = input.validate().map_err(SessionError::Invalid)?;
        tracing::Span::current().record("email", tracing::field::display(&email));
        let session = self
            .auth
            .sign_in_with_password(email.as_str(), &input.password)
            .await?;
        tracing::info!(user_id = %session.identity.id, "Signed in");
        self.set(Some(session));
        self.session
            .as_ref()
            .ok_or(SessionError::Gateway(GatewayError::EmptyResult("session")))
    }

    /// Create an account and attach name and phone to it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invalid` without calling the backend when the
    /// form fails validation, or the backend's error when sign-up fails.
    #[instrument(skip_all, fields(email = tracing::field::Empty))]
    pub async fn sign_up(&self, input: &RegistrationInput) -> Result<Identity, SessionError> {
        let email = input.validate().map_err(SessionError::Invalid)?;
        tracing::Span::current().record("email", tracing::field::display(&email));

        let metadata = UserMetadata {
            name: Some(input.name.trim().to_string()),
            phone: Some(input.phone.clone()),
        };
        let outcome = self
            .auth
            .sign_up(email.as_str(), &input.password, &metadata)
            .await?;

        if let Some(session) = &outcome.session
            && let Err(e) = self
                .auth
                .update_profile_metadata(&session.access_token, &metadata)
                .await
        {
            tracing::warn!(error = %e, "Failed to attach profile metadata after sign-up");
        }

        tracing::info!(user_id = %outcome.identity.id, "Account created");
        Ok(outcome.identity)
    }

    /// Sign out. The local state always ends `Anonymous`.
    #[instrument(skip_all)]
    pub async fn sign_out(&mut self) {
        if let Some(session) = &self.session
            && let Err(e) = self.auth.sign_out(&session.access_token).await
        {
            tracing::warn!(error = %e, "Remote sign-out failed");
        }
        self.set(None);
    }
}

/// What the access guard decides for a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'s> {
    /// Still resolving; show a loading indicator.
    Checking,
    /// Anonymous; send to the login page.
    Denied,
    Granted(&'s Identity),
}

/// Access guard for protected views.
#[must_use]
pub const fn access(state: &AuthState) -> Access<'_> {
    match state {
        AuthState::Loading => Access::Checking,
        AuthState::Anonymous => Access::Denied,
        AuthState::Authenticated(identity) => Access::Granted(identity),
    }
}

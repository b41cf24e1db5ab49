//! Authentication extractors and the access guard.
//!
//! The cookie session stores an [`AuthSession`]. On every request that asks
//! for it, the stored session is run through a [`SessionHolder`] (so expired
//! tokens get one refresh attempt) and the result is written back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{AuthSession, session_keys};
use crate::services::{Access, AuthState, SessionHolder, access};
use crate::state::AppState;

/// Where denied visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some_and(|v| v == "true")
}

/// Full-page loading indicator, refreshed until the session resolves.
#[derive(Template, WebTemplate)]
#[template(path = "loading.html")]
pub struct LoadingPage;

/// Loading indicator fragment for HTMX swaps.
#[derive(Template, WebTemplate)]
#[template(path = "partials/loading.html")]
pub struct LoadingFragment;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(session): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", session.identity.email)
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Why [`RequireAuth`] refused a request.
#[derive(Debug)]
pub enum AuthRejection {
    /// The session could not be resolved yet.
    Checking,
    /// Anonymous full-page request: redirect to login.
    RedirectToLogin,
    /// Anonymous HTMX request: ask the client to navigate to login.
    HtmxRedirect,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Checking => LoadingPage.into_response(),
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::HtmxRedirect => (
                [("HX-Redirect", HeaderValue::from_static(LOGIN_PATH))],
                LoadingFragment,
            )
                .into_response(),
        }
    }
}

/// Resolve the caller's auth state from the cookie session.
///
/// A missing session layer or an unreadable store leaves the state
/// `Loading`.
async fn resolve(parts: &Parts, state: &AppState) -> (AuthState, Option<AuthSession>) {
    let Some(session) = parts.extensions.get::<Session>() else {
        tracing::warn!("Session not found in request extensions - layer may be misconfigured");
        return (AuthState::Loading, None);
    };

    let stored = match session.get::<AuthSession>(session_keys::AUTH_SESSION).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session store");
            return (AuthState::Loading, None);
        }
    };
    let stored_token = stored
        .as_ref()
        .map(|s| s.access_token.expose().to_string());

    let mut holder = SessionHolder::new(state.backend());
    holder.restore(stored).await;

    match (stored_token, holder.session()) {
        (Some(old), Some(current)) if old != current.access_token.expose() => {
            if let Err(e) = set_auth_session(session, current).await {
                tracing::warn!(error = %e, "Failed to store refreshed session");
            }
        }
        (Some(_), None) => {
            if let Err(e) = clear_auth_session(session).await {
                tracing::warn!(error = %e, "Failed to clear expired session");
            }
        }
        _ => {}
    }

    (holder.state(), holder.into_session())
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (auth_state, session) = resolve(parts, state).await;
        match (access(&auth_state), session) {
            (Access::Granted(_), Some(session)) => Ok(Self(session)),
            (Access::Checking, _) => Err(AuthRejection::Checking),
            _ if is_htmx(&parts.headers) => Err(AuthRejection::HtmxRedirect),
            _ => Err(AuthRejection::RedirectToLogin),
        }
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this never rejects; an unresolved session reads as
/// anonymous.
pub struct OptionalAuth(pub Option<AuthSession>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (_, session) = resolve(parts, state).await;
        Ok(Self(session))
    }
}

/// Store `auth` in the session under a fresh session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::AUTH_SESSION, auth).await
}

/// Drop the stored session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }

    #[test]
    fn test_rejections() {
        let redirect = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect.headers()["location"], "/login");

        let htmx = AuthRejection::HtmxRedirect.into_response();
        assert_eq!(htmx.status(), StatusCode::OK);
        assert_eq!(htmx.headers()["hx-redirect"], "/login");

        assert_eq!(AuthRejection::Checking.into_response().status(), StatusCode::OK);
    }
}

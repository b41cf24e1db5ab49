//! Authentication route handlers.
//!
//! Login, registration and logout over the hosted backend's auth endpoints.
//! Forms are validated before anything is sent; a form that fails
//! validation is re-rendered with field messages and a 422.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use stg_catalog_core::{FieldErrors, LoginInput, RegistrationInput};

use super::feedback::messages;
use super::{Feedback, Layout};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, clear_auth_session, set_auth_session};
use crate::services::{SessionError, SessionHolder};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub errors: FieldErrors,
    pub feedback: Option<Feedback>,
}

/// Register page template.
///
/// `form` echoes what was typed, with both password fields cleared.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub form: RegistrationInput,
    pub errors: FieldErrors,
    pub feedback: Option<Feedback>,
}

fn without_passwords(form: RegistrationInput) -> RegistrationInput {
    RegistrationInput {
        password: String::new(),
        confirm_password: String::new(),
        ..form
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in visitors go straight to the catalog.
pub async fn login_page(OptionalAuth(session): OptionalAuth, nonce: CspNonce) -> Response {
    if session.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        layout: Layout::new(nonce, None),
        email: String::new(),
        errors: FieldErrors::default(),
        feedback: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Form(form): Form<LoginInput>,
) -> Response {
    let page = |nonce, errors, feedback| LoginTemplate {
        layout: Layout::new(nonce, None),
        email: form.email.clone(),
        errors,
        feedback,
    };

    let mut holder = SessionHolder::new(state.backend());
    let auth = match holder.sign_in(&form).await {
        Ok(auth) => auth,
        Err(SessionError::Invalid(errors)) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, page(nonce, errors, None)).into_response();
        }
        Err(SessionError::Gateway(e)) => {
            tracing::warn!(error = %e, "Login failed");
            let feedback = Some(Feedback::error(messages::BAD_CREDENTIALS));
            return (
                StatusCode::UNAUTHORIZED,
                page(nonce, FieldErrors::default(), feedback),
            )
                .into_response();
        }
    };

    if let Err(e) = set_auth_session(&session, auth).await {
        tracing::error!(error = %e, "Failed to store session after login");
        let feedback = Some(Feedback::error(messages::SESSION_FAILED));
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            page(nonce, FieldErrors::default(), feedback),
        )
            .into_response();
    }

    set_sentry_user(&auth.identity.id, Some(&auth.identity.email));
    Redirect::to("/").into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(session): OptionalAuth, nonce: CspNonce) -> Response {
    if session.is_some() {
        return Redirect::to("/").into_response();
    }
    RegisterTemplate {
        layout: Layout::new(nonce, None),
        form: RegistrationInput::default(),
        errors: FieldErrors::default(),
        feedback: None,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// Creating an account does not sign the visitor in; the backend may
/// require email confirmation first.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    nonce: CspNonce,
    Form(form): Form<RegistrationInput>,
) -> Response {
    let holder = SessionHolder::new(state.backend());
    let outcome = holder.sign_up(&form).await;

    let layout = Layout::new(nonce, None);
    match outcome {
        Ok(_) => RegisterTemplate {
            layout,
            form: RegistrationInput::default(),
            errors: FieldErrors::default(),
            feedback: Some(Feedback::success(messages::SIGN_UP_DONE)),
        }
        .into_response(),
        Err(SessionError::Invalid(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                layout,
                form: without_passwords(form),
                errors,
                feedback: None,
            },
        )
            .into_response(),
        Err(SessionError::Gateway(e)) => {
            tracing::warn!(error = %e, "Registration failed");
            (
                StatusCode::BAD_REQUEST,
                RegisterTemplate {
                    layout,
                    form: without_passwords(form),
                    errors: FieldErrors::default(),
                    feedback: Some(Feedback::error(messages::SIGN_UP_FAILED)),
                },
            )
                .into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out remotely (best effort) and drop the cookie session.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Redirect {
    let mut holder = SessionHolder::new(state.backend());
    holder.restore(auth).await;
    holder.sign_out().await;

    if let Err(e) = clear_auth_session(&session).await {
        tracing::error!(error = %e, "Failed to clear session on logout");
    }
    clear_sentry_user();
    Redirect::to("/")
}

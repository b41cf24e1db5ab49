//! Profile page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::Layout;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::services::{ProfileView, Profiles};
use crate::state::AppState;

const NAME_MISSING: &str = "Nome não informado";
const EMAIL_MISSING: &str = "E-mail não informado";
const PHONE_MISSING: &str = "Telefone não informado";

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ProfileTemplate {
    fn new(layout: Layout, view: ProfileView) -> Self {
        Self {
            layout,
            name: view.name.unwrap_or_else(|| NAME_MISSING.to_string()),
            email: view.email.unwrap_or_else(|| EMAIL_MISSING.to_string()),
            phone: view.phone.unwrap_or_else(|| PHONE_MISSING.to_string()),
        }
    }
}

/// Display the signed-in user's profile.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(session): RequireAuth,
    nonce: CspNonce,
) -> impl IntoResponse {
    let view = Profiles::new(state.backend()).profile(&session).await;
    ProfileTemplate::new(Layout::new(nonce, Some(&session)), view)
}

//! Page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::state::AppState;

/// Lookup page: sign-in button, VIN form and result area.
#[derive(Template, WebTemplate)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    /// OAuth client id for Google Identity Services.
    pub client_id: String,
    /// Domain hint shown next to the sign-in button.
    pub allowed_domain: String,
}

/// Lookup page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let identity = state.identity();
    IndexTemplate {
        client_id: identity.client_id.clone(),
        allowed_domain: identity.allowed_domain.clone(),
    }
}

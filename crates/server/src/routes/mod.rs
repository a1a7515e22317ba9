//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                    - Lookup page
//! GET  /healthz             - Health check
//!
//! # API (Authorization: Bearer <Google ID token>)
//! GET  /api/me              - Current caller's profile
//! GET  /api/ofertas?vin=    - Offer lookup (JSON)
//! GET  /api/ofertas/html?vin= - Offer lookup (HTML fragment)
//!
//! # Static
//! GET  /static/*            - CSS, JS and offer images
//! ```

pub mod api;
pub mod pages;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(api::me))
        .route("/ofertas", get(api::ofertas))
        .route("/ofertas/html", get(api::ofertas_html))
}

/// Create the main routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/healthz", get(health))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

//! Access gate extractor.
//!
//! Every protected route takes [`RequireIdentity`] as its first argument, so
//! the gate runs before anything else looks at the request:
//!
//! 1. no `Authorization: Bearer` token → 401 "not authenticated"
//! 2. token fails verification → 401 "invalid token"
//! 3. email not verified → 401 "email not verified"
//! 4. domain mismatch → 403 "domain not allowed"
//!
//! On success the [`Identity`] is also stored in the request extensions.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use ofertas_vin_core::Identity;

use crate::error::AppError;
use crate::identity::IdentityError;
use crate::services::{AuthError, authorize};
use crate::state::AppState;

/// Extractor that requires a verified identity from the allowed domain.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireIdentity(identity): RequireIdentity,
/// ) -> impl IntoResponse {
///     format!("Hola, {}", identity.display_name())
/// }
/// ```
pub struct RequireIdentity(pub Identity);

impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::NotAuthenticated)?;

        let claims = state.verifier().verify(token).await.map_err(|e| match e {
            IdentityError::InvalidToken(reason) => {
                tracing::debug!(reason, "Token rejected");
                AppError::Auth(AuthError::InvalidToken)
            }
            other => AppError::Identity(other),
        })?;

        let identity = authorize(claims, &state.identity().allowed_domain).inspect_err(|e| {
            tracing::info!(reason = %e, "Access denied");
        })?;

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                email: Some(identity.email.to_string()),
                ..Default::default()
            }));
        });

        parts.extensions.insert(identity.clone());
        Ok(Self(identity))
    }
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

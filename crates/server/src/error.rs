//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server faults are captured to Sentry
//! and logged before responding; the client only ever sees a generic detail.
//!
//! | Variant | Status | Body |
//! |---|---|---|
//! | `Validation` | 400 | `{ "error": <message> }` |
//! | `NotFound` | 404 | `{ "vin", "found": false, "message" }` |
//! | `Auth` | 401 / 403 | `{ "error": <reason> }` |
//! | `Identity`, `Warehouse`, `Template` | 500 | `{ "error": "Error interno", "detail" }` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ofertas_vin_core::VinError;
use serde_json::json;
use thiserror::Error;

use crate::identity::IdentityError;
use crate::services::AuthError;
use crate::warehouse::WarehouseError;

/// Message returned when the warehouse has no row for a VIN.
pub const NOT_FOUND_MESSAGE: &str = "No se encontraron ofertas para el VIN proporcionado.";

/// Generic detail returned for server faults.
pub const INTERNAL_DETAIL: &str = "No fue posible completar la consulta. Intente de nuevo más tarde.";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// The VIN is missing or malformed.
    #[error("Validation error: {0}")]
    Validation(#[from] VinError),

    /// The warehouse has no offers for the VIN. Not a fault.
    #[error("No offers for VIN {vin}")]
    NotFound { vin: String },

    /// The access gate rejected the request.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The identity provider failed (not a rejected token).
    #[error("Identity provider error: {0}")]
    Identity(IdentityError),

    /// The warehouse lookup failed.
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Auth(AuthError::DomainNotAllowed) => StatusCode::FORBIDDEN,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Identity(_) | Self::Warehouse(_) | Self::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this error is a server fault worth reporting.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Identity(_) | Self::Warehouse(_) | Self::Template(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Validation(err) => json!({ "error": err.to_string() }),
            Self::NotFound { vin } => json!({
                "vin": vin,
                "found": false,
                "message": NOT_FOUND_MESSAGE,
            }),
            Self::Auth(err) => json!({ "error": err.to_string() }),
            Self::Identity(_) | Self::Warehouse(_) | Self::Template(_) => json!({
                "error": "Error interno",
                "detail": INTERNAL_DETAIL,
            }),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation(VinError::EmptyInput).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound { vin: "X".to_string() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthError::NotAuthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::EmailNotVerified).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::DomainNotAllowed).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Warehouse(WarehouseError::Incomplete).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Identity(IdentityError::Provider(503)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body() {
        let (status, body) = body_json(AppError::Validation(VinError::InvalidCharacters)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "VIN inválido." }));
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_json(AppError::NotFound {
            vin: "1HGCM82633A004352".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({
                "vin": "1HGCM82633A004352",
                "found": false,
                "message": NOT_FOUND_MESSAGE,
            })
        );
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let (status, body) = body_json(AppError::Warehouse(WarehouseError::Api {
            status: 403,
            message: "Access Denied: Table secreto.tabla".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error interno");
        assert_eq!(body["detail"], INTERNAL_DETAIL);
        assert!(!body.to_string().contains("secreto"));
    }

    #[tokio::test]
    async fn test_auth_body() {
        let (status, body) = body_json(AppError::Auth(AuthError::DomainNotAllowed)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "domain not allowed" }));
    }
}

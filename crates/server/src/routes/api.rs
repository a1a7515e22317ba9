//! Offer lookup API.
//!
//! Both lookup routes run the same pipeline after the access gate: record the
//! use, validate the VIN, query the warehouse. `/api/ofertas` answers JSON,
//! `/api/ofertas/html` answers the fragment the page swaps in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};
use ofertas_vin_core::catalog;
use ofertas_vin_core::resolver::{self, ResolvedOffer};
use ofertas_vin_core::{Identity, OfferRecord, Vin};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, NOT_FOUND_MESSAGE, Result};
use crate::middleware::RequireIdentity;
use crate::state::AppState;

/// Title shown when the row has no primary offer.
pub const NO_PRIMARY_TITLE: &str = "Sin información";

/// Description shown for a primary offer missing from the knowledge base.
pub const PRIMARY_FALLBACK: &str = "No hay descripción disponible para esta oferta.";

/// Description shown for a secondary offer missing from the knowledge base.
pub const SECONDARY_FALLBACK: &str = "Oferta adicional disponible.";

/// First `vin` parameter of a query string.
///
/// Repeated or undecodable parameters never reject the request: whatever
/// comes first goes through VIN validation, after the access gate.
#[must_use]
pub fn vin_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "vin")
        .map(|(_, value)| value.into_owned())
}

/// JSON body of a successful lookup.
#[derive(Debug, Serialize)]
pub struct OffersResponse {
    pub vin: String,
    pub found: bool,
    pub oferta_principal: Option<String>,
    pub ofertas: Vec<String>,
    pub status_cliente_principal: Option<String>,
}

impl From<OfferRecord> for OffersResponse {
    fn from(record: OfferRecord) -> Self {
        Self {
            vin: record.vin,
            found: true,
            oferta_principal: record.primary_offer,
            ofertas: record.secondary_offers,
            status_cliente_principal: record.customer_status,
        }
    }
}

/// JSON body of `/api/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Offer cards fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/offers.html")]
pub struct OffersTemplate {
    pub vin: String,
    pub primary: ResolvedOffer,
    pub status: Option<String>,
    pub status_legend: Option<&'static str>,
    pub secondary: Vec<ResolvedOffer>,
}

impl OffersTemplate {
    #[must_use]
    pub fn from_record(record: &OfferRecord) -> Self {
        let primary = record.primary_offer.as_deref().map_or_else(
            || ResolvedOffer {
                title: NO_PRIMARY_TITLE.to_string(),
                description_html: resolver::description_html(PRIMARY_FALLBACK),
                image: catalog::DEFAULT_IMAGE,
            },
            |name| ResolvedOffer::resolve(name, PRIMARY_FALLBACK),
        );

        Self {
            vin: record.vin.clone(),
            primary,
            status: record.customer_status.clone(),
            status_legend: record
                .customer_status
                .as_deref()
                .and_then(resolver::status_legend),
            secondary: record
                .secondary_offers
                .iter()
                .map(|name| ResolvedOffer::resolve(name, SECONDARY_FALLBACK))
                .collect(),
        }
    }
}

/// "No results" fragment for validation failures and unknown VINs.
#[derive(Template, WebTemplate)]
#[template(path = "partials/no_results.html")]
pub struct NoResultsTemplate {
    pub message: String,
}

/// Current caller's profile.
#[instrument(skip_all)]
pub async fn me(RequireIdentity(identity): RequireIdentity) -> Json<MeResponse> {
    Json(MeResponse {
        email: identity.email.to_string(),
        name: identity.display_name().to_string(),
        picture: identity.picture,
    })
}

/// Offer lookup (JSON).
#[instrument(skip(identity, state), fields(email = %identity.email))]
pub async fn ofertas(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<OffersResponse>> {
    let record = lookup(&state, &identity, vin_param(query.as_deref()).as_deref()).await?;
    Ok(Json(record.into()))
}

/// Offer lookup (HTML fragment).
///
/// Validation failures and unknown VINs render the "no results" fragment with
/// the matching status; server faults fall through to the JSON error body.
#[instrument(skip(identity, state), fields(email = %identity.email))]
pub async fn ofertas_html(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    match lookup(&state, &identity, vin_param(query.as_deref()).as_deref()).await {
        Ok(record) => Ok(OffersTemplate::from_record(&record).into_response()),
        Err(err @ (AppError::Validation(_) | AppError::NotFound { .. })) => {
            let message = match &err {
                AppError::Validation(e) => e.to_string(),
                _ => NOT_FOUND_MESSAGE.to_string(),
            };
            Ok((err.status(), NoResultsTemplate { message }).into_response())
        }
        Err(err) => Err(err),
    }
}

/// Record the use, validate the VIN and fetch its offers.
async fn lookup(
    state: &AppState,
    identity: &Identity,
    raw_vin: Option<&str>,
) -> Result<OfferRecord> {
    state.usage().record(identity);

    let vin = Vin::parse(raw_vin.unwrap_or_default())?;
    tracing::info!(vin = %vin, "Looking up offers");

    state
        .offers()
        .find_offers(&vin)
        .await?
        .ok_or_else(|| AppError::NotFound {
            vin: vin.into_inner(),
        })
}

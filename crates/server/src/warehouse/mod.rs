//! Warehouse (`BigQuery`) client.
//!
//! Provides the offer lookup behind [`OfferStore`] and the usage audit
//! append behind [`UsageSink`](crate::services::usage::UsageSink). Both talk
//! to the `BigQuery` v2 REST API with a service account access token.

pub mod auth;
pub mod queries;
pub mod rows;

use async_trait::async_trait;
use ofertas_vin_core::{OfferRecord, Vin};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use crate::config::{OffersTable, UsageTable, WarehouseConfig};
use crate::services::usage::{UsageRow, UsageSink};

pub use auth::AccessTokenSource;

/// `BigQuery` v2 REST API base URL.
pub const API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// How long `jobs.query` may wait for the job before answering.
const QUERY_TIMEOUT_MS: u32 = 10_000;

/// Errors that can occur when talking to the warehouse.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Could not obtain an access token.
    #[error("Auth error: {0}")]
    Auth(String),

    /// The query job did not finish within the synchronous wait.
    #[error("Query job did not complete in time")]
    Incomplete,

    /// Streaming insert rejected some rows.
    #[error("Insert rejected: {0}")]
    InsertRejected(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Finds the offer row for a VIN.
#[async_trait]
pub trait OfferStore: Send + Sync {
    /// Look up the offers for `vin`.
    ///
    /// Returns `Ok(None)` when the table has no row for the VIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the warehouse could not be queried.
    async fn find_offers(&self, vin: &Vin) -> Result<Option<OfferRecord>, WarehouseError>;
}

/// `BigQuery` REST client.
pub struct BigQueryClient {
    client: reqwest::Client,
    api_base: String,
    project_id: String,
    offers: OffersTable,
    usage: UsageTable,
    tokens: AccessTokenSource,
}

impl BigQueryClient {
    /// Create a new `BigQuery` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the service account key cannot be loaded.
    pub fn new(client: reqwest::Client, config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        Ok(Self {
            tokens: AccessTokenSource::new(client.clone(), config.credentials.clone())?,
            client,
            api_base: API_BASE.to_string(),
            project_id: config.project_id.clone(),
            offers: config.offers.clone(),
            usage: config.usage.clone(),
        })
    }

    /// Point the client at another API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, WarehouseError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WarehouseError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl OfferStore for BigQueryClient {
    #[instrument(skip(self), fields(vin = %vin))]
    async fn find_offers(&self, vin: &Vin) -> Result<Option<OfferRecord>, WarehouseError> {
        let url = format!("{}/projects/{}/queries", self.api_base, self.project_id);
        let body = json!({
            "query": queries::offer_lookup(&self.project_id, &self.offers),
            "useLegacySql": false,
            "parameterMode": "NAMED",
            "queryParameters": [{
                "name": queries::VIN_PARAM,
                "parameterType": { "type": "STRING" },
                "parameterValue": { "value": vin.as_str() },
            }],
            "timeoutMs": QUERY_TIMEOUT_MS,
            "maxResults": 1,
        });

        let response: rows::QueryResponse = self
            .post_json(&url, &body)
            .await?
            .json()
            .await
            .map_err(|e| WarehouseError::Parse(e.to_string()))?;

        if !response.job_complete {
            return Err(WarehouseError::Incomplete);
        }

        let record = rows::decode_rows(&response)
            .first()
            .map(|row| rows::offer_record(row, vin.as_str()));

        tracing::info!(found = record.is_some(), "Offer lookup finished");
        Ok(record)
    }
}

#[async_trait]
impl UsageSink for BigQueryClient {
    #[instrument(skip(self, row), fields(email = %row.email))]
    async fn append(&self, row: &UsageRow) -> Result<(), WarehouseError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}/insertAll",
            self.api_base, self.project_id, self.usage.dataset, self.usage.table
        );
        let body = json!({ "rows": [{ "json": row }] });

        let response: InsertAllResponse = self
            .post_json(&url, &body)
            .await?
            .json()
            .await
            .map_err(|e| WarehouseError::Parse(e.to_string()))?;

        if !response.insert_errors.is_empty() {
            return Err(WarehouseError::InsertRejected(
                serde_json::Value::Array(response.insert_errors).to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertAllResponse {
    #[serde(default)]
    insert_errors: Vec<serde_json::Value>,
}

/// Extract `error.message` from a Google API error body, or fall back to the
/// raw text.
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.to_string())
}

//! Service account access tokens for the warehouse API.
//!
//! Signs an RS256 JWT assertion with the service account key and exchanges it
//! at the key's `token_uri` (OAuth 2.0 JWT bearer grant). The access token is
//! cached and reused until shortly before it expires.

use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::WarehouseError;
use crate::config::ServiceAccountKey;

/// OAuth scope for `BigQuery` reads and streaming inserts.
const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the cached token expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

const fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: SecretString,
    refresh_at: Instant,
}

/// Issues and caches access tokens for one service account.
pub struct AccessTokenSource {
    client: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenSource {
    /// Create a token source for `key`.
    ///
    /// # Errors
    ///
    /// Returns `WarehouseError::Auth` if the private key is not a valid RSA PEM.
    pub fn new(client: reqwest::Client, key: ServiceAccountKey) -> Result<Self, WarehouseError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| WarehouseError::Auth(format!("invalid service account key: {e}")))?;

        Ok(Self {
            client,
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, fetching a new one if needed.
    ///
    /// Concurrent callers wait for a single refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if signing the assertion or the token exchange fails.
    pub async fn access_token(&self) -> Result<SecretString, WarehouseError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch(&self) -> Result<CachedToken, WarehouseError> {
        let assertion = self.sign_assertion(chrono::Utc::now().timestamp())?;

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", JWT_BEARER_GRANT)
            .append_pair("assertion", &assertion)
            .finish();

        let response = self
            .client
            .post(&self.key.token_uri)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WarehouseError::Auth(format!(
                "token exchange failed with status {}: {message}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| WarehouseError::Parse(format!("token response: {e}")))?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Fetched warehouse access token"
        );

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(REFRESH_MARGIN);
        Ok(CachedToken {
            value: SecretString::from(token.access_token),
            refresh_at: Instant::now() + lifetime,
        })
    }

    fn sign_assertion(&self, now: i64) -> Result<String, WarehouseError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: BIGQUERY_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| WarehouseError::Auth(format!("failed to sign assertion: {e}")))
    }
}

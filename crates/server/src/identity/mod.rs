//! Identity provider client.
//!
//! Verifies Google Sign-In ID tokens. The rest of the server only depends on
//! the [`TokenVerifier`] contract:
//!
//! ```text
//! verify(token) -> { email, email_verified, hosted_domain, name, picture }
//!                  or IdentityError::InvalidToken
//! ```
//!
//! [`GoogleTokenVerifier`] implements it with Google's `tokeninfo` endpoint,
//! which checks the signature, then validates audience, issuer and expiry
//! locally.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Google `tokeninfo` endpoint.
pub const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Issuers Google uses for ID tokens.
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Errors from token verification.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is malformed, expired, forged or issued for another client.
    #[error("invalid token: {0}")]
    InvalidToken(&'static str),

    /// The identity provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The identity provider answered with an unexpected status.
    #[error("identity provider returned status {0}")]
    Provider(u16),
}

/// Claims taken from a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub email: String,
    pub email_verified: bool,
    /// Google Workspace domain of the account (`hd` claim).
    pub hosted_domain: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies bearer tokens against an identity provider.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidToken` when the token is not acceptable
    /// and the other variants when the provider itself failed.
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError>;
}

/// Google ID token verifier backed by the `tokeninfo` endpoint.
#[derive(Clone)]
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    endpoint: Url,
    audience: String,
}

impl GoogleTokenVerifier {
    /// Create a verifier that accepts tokens issued for `audience`.
    ///
    /// # Errors
    ///
    /// Returns an error if `endpoint` is not a valid URL.
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        audience: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            audience: audience.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("id_token", token);

        // The URL carries the token; keep it out of error messages.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), "tokeninfo rejected token");
            return Err(IdentityError::InvalidToken("rejected by identity provider"));
        }
        if !status.is_success() {
            return Err(IdentityError::Provider(status.as_u16()));
        }

        let info: TokenInfo = response.json().await.map_err(reqwest::Error::without_url)?;
        check_claims(info, &self.audience, chrono::Utc::now().timestamp())
    }
}

/// `tokeninfo` response. Google encodes most values as strings.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    exp: Option<StringOrNumber>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<StringOrBool>,
    #[serde(default)]
    hd: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrBool {
    Bool(bool),
    Text(String),
}

impl StringOrBool {
    fn is_true(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(text) => text.eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Number(i64),
    Text(String),
}

impl StringOrNumber {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Validate audience, issuer and expiry, then extract the claims we use.
fn check_claims(info: TokenInfo, audience: &str, now: i64) -> Result<VerifiedClaims, IdentityError> {
    if info.aud.as_deref() != Some(audience) {
        return Err(IdentityError::InvalidToken("issued for another client"));
    }

    if !info
        .iss
        .as_deref()
        .is_some_and(|iss| GOOGLE_ISSUERS.contains(&iss))
    {
        return Err(IdentityError::InvalidToken("unexpected issuer"));
    }

    let expires_at = info
        .exp
        .as_ref()
        .and_then(StringOrNumber::as_i64)
        .ok_or(IdentityError::InvalidToken("missing expiry"))?;
    if expires_at <= now {
        return Err(IdentityError::InvalidToken("expired"));
    }

    let email = info
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or(IdentityError::InvalidToken("missing email claim"))?;

    Ok(VerifiedClaims {
        email,
        email_verified: info.email_verified.as_ref().is_some_and(StringOrBool::is_true),
        hosted_domain: info.hd.filter(|hd| !hd.trim().is_empty()),
        name: info.name,
        picture: info.picture,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    const AUDIENCE: &str = "1234.apps.googleusercontent.com";
    const NOW: i64 = 1_760_000_000;

    fn token_info(overrides: serde_json::Value) -> TokenInfo {
        let mut base = json!({
            "iss": "https://accounts.google.com",
            "aud": AUDIENCE,
            "exp": (NOW + 600).to_string(),
            "email": "ana@grupogranauto.mx",
            "email_verified": "true",
            "hd": "grupogranauto.mx",
            "name": "Ana López",
            "picture": "https://lh3.googleusercontent.com/a/photo",
        });
        if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
            for (key, value) in overrides {
                base.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_check_claims_valid() {
        let claims = check_claims(token_info(json!({})), AUDIENCE, NOW).unwrap();
        assert_eq!(claims.email, "ana@grupogranauto.mx");
        assert!(claims.email_verified);
        assert_eq!(claims.hosted_domain.as_deref(), Some("grupogranauto.mx"));
        assert_eq!(claims.name.as_deref(), Some("Ana López"));
    }

    #[test]
    fn test_check_claims_accepts_native_json_types() {
        let info = token_info(json!({
            "iss": "accounts.google.com",
            "exp": NOW + 60,
            "email_verified": true,
        }));
        let claims = check_claims(info, AUDIENCE, NOW).unwrap();
        assert!(claims.email_verified);
    }

    #[test]
    fn test_check_claims_wrong_audience() {
        let info = token_info(json!({ "aud": "other.apps.googleusercontent.com" }));
        assert!(matches!(
            check_claims(info, AUDIENCE, NOW),
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_check_claims_wrong_issuer() {
        let info = token_info(json!({ "iss": "https://evil.example.com" }));
        assert!(matches!(
            check_claims(info, AUDIENCE, NOW),
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_check_claims_expired() {
        let info = token_info(json!({ "exp": NOW.to_string() }));
        assert!(matches!(
            check_claims(info, AUDIENCE, NOW),
            Err(IdentityError::InvalidToken("expired"))
        ));
    }

    #[test]
    fn test_check_claims_unverified_email_is_reported_not_rejected() {
        let info = token_info(json!({ "email_verified": "false" }));
        let claims = check_claims(info, AUDIENCE, NOW).unwrap();
        assert!(!claims.email_verified);
    }

    #[test]
    fn test_check_claims_missing_email() {
        let info = token_info(json!({ "email": null }));
        assert!(matches!(
            check_claims(info, AUDIENCE, NOW),
            Err(IdentityError::InvalidToken("missing email claim"))
        ));
    }

    #[test]
    fn test_check_claims_blank_hosted_domain_is_none() {
        let info = token_info(json!({ "hd": "" }));
        let claims = check_claims(info, AUDIENCE, NOW).unwrap();
        assert_eq!(claims.hosted_domain, None);
    }

    #[tokio::test]
    async fn test_verify_calls_tokeninfo() {
        let mut server = mockito::Server::new_async().await;
        let exp = (chrono::Utc::now().timestamp() + 600).to_string();
        let mock = server
            .mock("GET", "/tokeninfo")
            .match_query(Matcher::UrlEncoded("id_token".into(), "good-token".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "iss": "accounts.google.com",
                    "aud": AUDIENCE,
                    "exp": exp,
                    "email": "ana@grupogranauto.mx",
                    "email_verified": "true",
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let verifier = GoogleTokenVerifier::new(
            reqwest::Client::new(),
            &format!("{}/tokeninfo", server.url()),
            AUDIENCE,
        )
        .unwrap();

        let claims = verifier.verify("good-token").await.unwrap();
        assert_eq!(claims.email, "ana@grupogranauto.mx");
        assert_eq!(claims.hosted_domain, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_verify_rejected_token_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tokeninfo")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"invalid_token"}"#)
            .create_async()
            .await;

        let verifier = GoogleTokenVerifier::new(
            reqwest::Client::new(),
            &format!("{}/tokeninfo", server.url()),
            AUDIENCE,
        )
        .unwrap();

        assert!(matches!(
            verifier.verify("bad-token").await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_provider_outage_is_not_invalid_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tokeninfo")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let verifier = GoogleTokenVerifier::new(
            reqwest::Client::new(),
            &format!("{}/tokeninfo", server.url()),
            AUDIENCE,
        )
        .unwrap();

        let err = verifier.verify("secret-token").await.unwrap_err();
        assert!(matches!(err, IdentityError::Provider(503)));
        assert!(!err.to_string().contains("secret-token"));
    }
}

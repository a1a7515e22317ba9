//! Test harness for the VIN offer lookup router.
//!
//! [`TestApp`] builds the real router around in-memory collaborators:
//!
//! - [`FakeVerifier`] - maps fixed tokens to claims
//! - [`MemoryOfferStore`] - offer rows keyed by VIN
//! - [`ChannelUsageSink`] - forwards every usage row to the test
//!
//! # Tokens
//!
//! | Token | Caller |
//! |---|---|
//! | [`VALID_TOKEN`] | verified `ana@grupogranauto.mx` |
//! | [`HOSTED_TOKEN`] | verified gmail address with `hd = grupogranauto.mx` |
//! | [`OUTSIDER_TOKEN`] | verified `eve@example.com` |
//! | [`UNVERIFIED_TOKEN`] | unverified `luis@grupogranauto.mx` |
//! | [`OUTAGE_TOKEN`] | identity provider unavailable |
//!
//! Any other token is rejected as invalid.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header::AUTHORIZATION},
};
use ofertas_vin_core::{OfferRecord, Vin};
use ofertas_vin_server::config::IdentityConfig;
use ofertas_vin_server::identity::{IdentityError, TokenVerifier, VerifiedClaims};
use ofertas_vin_server::services::{UsageRecorder, UsageRow, UsageSink};
use ofertas_vin_server::state::AppState;
use ofertas_vin_server::warehouse::{OfferStore, WarehouseError};
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const ALLOWED_DOMAIN: &str = "grupogranauto.mx";
pub const CLIENT_ID: &str = "1234.apps.googleusercontent.com";

pub const VALID_TOKEN: &str = "token-ana";
pub const HOSTED_TOKEN: &str = "token-hosted";
pub const OUTSIDER_TOKEN: &str = "token-outsider";
pub const UNVERIFIED_TOKEN: &str = "token-unverified";
pub const OUTAGE_TOKEN: &str = "token-outage";

/// VIN present in the default offer store.
pub const KNOWN_VIN: &str = "1HGCM82633A004352";
/// Well-formed VIN absent from the default offer store.
pub const UNKNOWN_VIN: &str = "2T1BURHE0JC012345";
/// Well-formed VIN whose lookup fails in the warehouse.
pub const BROKEN_VIN: &str = "3VWFE21C04M000001";

/// Token verifier with a fixed token table.
pub struct FakeVerifier;

fn claims(email: &str, verified: bool, hosted_domain: Option<&str>) -> VerifiedClaims {
    VerifiedClaims {
        email: email.to_string(),
        email_verified: verified,
        hosted_domain: hosted_domain.map(str::to_string),
        name: Some("Ana Torres".to_string()),
        picture: Some("https://lh3.googleusercontent.com/a/ana".to_string()),
    }
}

#[async_trait]
impl TokenVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError> {
        match token {
            VALID_TOKEN => Ok(claims("ana@grupogranauto.mx", true, Some(ALLOWED_DOMAIN))),
            HOSTED_TOKEN => Ok(claims("ana.torres@gmail.com", true, Some(ALLOWED_DOMAIN))),
            OUTSIDER_TOKEN => Ok(claims("eve@example.com", true, None)),
            UNVERIFIED_TOKEN => Ok(claims("luis@grupogranauto.mx", false, None)),
            OUTAGE_TOKEN => Err(IdentityError::Provider(503)),
            _ => Err(IdentityError::InvalidToken("unknown token")),
        }
    }
}

/// Offer rows keyed by VIN. [`BROKEN_VIN`] always fails.
///
/// Every call to `find_offers` is counted, found or not.
#[derive(Default)]
pub struct MemoryOfferStore {
    rows: HashMap<String, OfferRecord>,
    lookups: Arc<AtomicUsize>,
}

impl MemoryOfferStore {
    #[must_use]
    pub fn with(mut self, record: OfferRecord) -> Self {
        self.rows.insert(record.vin.clone(), record);
        self
    }
}

#[async_trait]
impl OfferStore for MemoryOfferStore {
    async fn find_offers(&self, vin: &Vin) -> Result<Option<OfferRecord>, WarehouseError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if vin.as_str() == BROKEN_VIN {
            return Err(WarehouseError::Api {
                status: 500,
                message: "backend error".to_string(),
            });
        }
        Ok(self.rows.get(vin.as_str()).cloned())
    }
}

/// Usage sink that hands every row to the test.
pub struct ChannelUsageSink(mpsc::UnboundedSender<UsageRow>);

#[async_trait]
impl UsageSink for ChannelUsageSink {
    async fn append(&self, row: &UsageRow) -> Result<(), WarehouseError> {
        let _ = self.0.send(row.clone());
        Ok(())
    }
}

/// The row stored for [`KNOWN_VIN`].
#[must_use]
pub fn known_record() -> OfferRecord {
    OfferRecord {
        vin: KNOWN_VIN.to_string(),
        primary_offer: Some("Inactivos".to_string()),
        secondary_offers: vec!["Primer servicio".to_string(), "Lavado gratis".to_string()],
        customer_status: Some("POTENCIAL".to_string()),
    }
}

/// Router plus the receiving end of the usage audit.
pub struct TestApp {
    router: Router,
    usage: mpsc::UnboundedReceiver<UsageRow>,
    lookups: Arc<AtomicUsize>,
}

/// Response status, headers and body text.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.body))
    }

    /// Value of a response header, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// App with [`known_record`] in the offer store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryOfferStore::default().with(known_record()))
    }

    #[must_use]
    pub fn with_store(store: MemoryOfferStore) -> Self {
        let (tx, usage) = mpsc::unbounded_channel();
        let lookups = Arc::clone(&store.lookups);
        let state = AppState::from_parts(
            IdentityConfig {
                client_id: CLIENT_ID.to_string(),
                allowed_domain: ALLOWED_DOMAIN.to_string(),
            },
            Arc::new(FakeVerifier),
            Arc::new(store),
            UsageRecorder::new(Arc::new(ChannelUsageSink(tx)), chrono_tz::America::Mexico_City),
        );

        let static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../server/static");
        Self {
            router: ofertas_vin_server::app(state, &static_dir, None),
            usage,
            lookups,
        }
    }

    /// Send a GET request, with a bearer token when `token` is set.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = request
            .body(Body::empty())
            .unwrap_or_else(|e| panic!("bad request {uri}: {e}"));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("unreadable body for {uri}: {e}"));

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Number of queries that reached the offer store.
    #[must_use]
    pub fn warehouse_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Wait for the next usage row.
    ///
    /// # Panics
    ///
    /// Panics if no row arrives within a second.
    pub async fn next_usage(&mut self) -> UsageRow {
        tokio::time::timeout(Duration::from_secs(1), self.usage.recv())
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| panic!("no usage row recorded"))
    }

    /// Whether a usage row arrives within a short grace period.
    pub async fn usage_recorded(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(100), self.usage.recv())
            .await
            .is_ok_and(|row| row.is_some())
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{IdentityConfig, ServerConfig};
use crate::identity::{GoogleTokenVerifier, TOKENINFO_ENDPOINT, TokenVerifier};
use crate::services::UsageRecorder;
use crate::warehouse::{BigQueryClient, OfferStore, WarehouseError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("invalid identity provider endpoint: {0}")]
    IdentityEndpoint(#[from] url::ParseError),
    #[error("warehouse client: {0}")]
    Warehouse(#[from] WarehouseError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The identity provider and the
/// warehouse sit behind traits so they can be replaced in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    identity: IdentityConfig,
    verifier: Arc<dyn TokenVerifier>,
    offers: Arc<dyn OfferStore>,
    usage: UsageRecorder,
}

impl AppState {
    /// Create the production state: Google token verification and one
    /// `BigQuery` client for both lookups and the usage audit.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client or the service account key cannot
    /// be set up.
    pub fn new(config: &ServerConfig) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let verifier = GoogleTokenVerifier::new(
            http.clone(),
            TOKENINFO_ENDPOINT,
            config.identity.client_id.clone(),
        )?;
        let warehouse = Arc::new(BigQueryClient::new(http, &config.warehouse)?);

        Ok(Self::from_parts(
            config.identity.clone(),
            Arc::new(verifier),
            Arc::clone(&warehouse) as Arc<dyn OfferStore>,
            UsageRecorder::new(warehouse, config.warehouse.usage.timezone),
        ))
    }

    /// Assemble state from already-built collaborators.
    #[must_use]
    pub fn from_parts(
        identity: IdentityConfig,
        verifier: Arc<dyn TokenVerifier>,
        offers: Arc<dyn OfferStore>,
        usage: UsageRecorder,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                identity,
                verifier,
                offers,
                usage,
            }),
        }
    }

    /// Identity provider client id and allowed domain.
    #[must_use]
    pub fn identity(&self) -> &IdentityConfig {
        &self.inner.identity
    }

    /// Get the token verifier.
    #[must_use]
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.inner.verifier.as_ref()
    }

    /// Get the offer store.
    #[must_use]
    pub fn offers(&self) -> &dyn OfferStore {
        self.inner.offers.as_ref()
    }

    /// Get the usage recorder.
    #[must_use]
    pub fn usage(&self) -> &UsageRecorder {
        &self.inner.usage
    }
}

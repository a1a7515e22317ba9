//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GOOGLE_PROJECT_ID` - Warehouse (`BigQuery`) project
//! - `GOOGLE_APPLICATION_CREDENTIALS_JSON` - Service account key JSON (inline), or
//! - `GOOGLE_APPLICATION_CREDENTIALS` - Path to the service account key file
//! - `GOOGLE_CLIENT_ID` - OAuth client ID that ID tokens must be issued for
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8080)
//! - `ALLOWED_EMAIL_DOMAIN` - Organizational email domain (default: grupogranauto.mx)
//! - `CORS_ORIGIN` - Origin allowed to call the API cross-site (default: none)
//! - `STATIC_DIR` - Directory served under `/static` (default: crates/server/static)
//! - `OFFERS_DATASET` / `OFFERS_TABLE` - Offers table location
//! - `OFFERS_VIN_COLUMN` / `OFFERS_PRIMARY_COLUMN` / `OFFERS_LIST_COLUMN` /
//!   `OFFERS_STATUS_COLUMN` - Offers table column names
//! - `USAGE_DATASET` / `USAGE_TABLE` - Usage audit table location
//! - `USAGE_TIMEZONE` - IANA time zone for audit timestamps (default: America/Mexico_City)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono_tz::Tz;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Default token endpoint for service account assertions.
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Failed to read {0}: {1}")]
    Unreadable(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origin allowed to call the API from another site
    pub cors_origin: Option<String>,
    /// Directory with CSS, JS and offer images
    pub static_dir: PathBuf,
    /// Identity provider and domain policy
    pub identity: IdentityConfig,
    /// Warehouse project, credentials and tables
    pub warehouse: WarehouseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Identity provider configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// OAuth client ID; ID tokens must carry it as their audience.
    pub client_id: String,
    /// Email domain callers must belong to.
    pub allowed_domain: String,
}

/// Warehouse configuration.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// `BigQuery` project that owns the tables and runs the jobs.
    pub project_id: String,
    /// Service account used for all warehouse calls.
    pub credentials: ServiceAccountKey,
    /// Where offers are read from.
    pub offers: OffersTable,
    /// Where usage audit rows are appended.
    pub usage: UsageTable,
}

/// Offers table location and column names.
///
/// The table schema has drifted between revisions (`oferta_principal` vs
/// `oferta_principal_r`), so every column name is configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffersTable {
    pub dataset: String,
    pub table: String,
    pub vin_column: String,
    pub primary_column: String,
    pub offers_column: String,
    pub status_column: String,
}

impl Default for OffersTable {
    fn default() -> Self {
        Self {
            dataset: "Ofertas_Comerciales".to_string(),
            table: "vin_ofertas_consolidado".to_string(),
            vin_column: "vin".to_string(),
            primary_column: "oferta_principal_r".to_string(),
            offers_column: "ofertas_r".to_string(),
            status_column: "status_cliente_principal".to_string(),
        }
    }
}

/// Usage audit table location and clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageTable {
    pub dataset: String,
    pub table: String,
    /// Organizational time zone for the `date` and `timestamp` columns.
    pub timezone: Tz,
}

impl Default for UsageTable {
    fn default() -> Self {
        Self {
            dataset: "Ofertas_Comerciales".to_string(),
            table: "uso_herramienta".to_string(),
            timezone: chrono_tz::America::Mexico_City,
        }
    }
}

/// Google service account key.
///
/// Implements `Debug` manually to redact the private key.
#[derive(Clone)]
pub struct ServiceAccountKey {
    /// Service account email, used as the assertion issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: SecretString,
    /// OAuth token endpoint.
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Raw key file shape; only the fields we use.
#[derive(Deserialize)]
struct ServiceAccountKeyFile {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Parse a service account key from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or lacks `client_email` or
    /// `private_key`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: ServiceAccountKeyFile = serde_json::from_str(json)?;
        Ok(Self {
            client_email: file.client_email,
            private_key: SecretString::from(file.private_key),
            token_uri: file
                .token_uri
                .filter(|uri| !uri.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the service account key cannot be read or parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let cors_origin = get_optional_env("CORS_ORIGIN")
            .map(|origin| parse_origin("CORS_ORIGIN", &origin))
            .transpose()?;
        let static_dir = PathBuf::from(get_env_or_default("STATIC_DIR", "crates/server/static"));

        let identity = IdentityConfig::from_env()?;
        let warehouse = WarehouseConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            cors_origin,
            static_dir,
            identity,
            warehouse,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let allowed_domain = get_env_or_default("ALLOWED_EMAIL_DOMAIN", "grupogranauto.mx")
            .trim()
            .trim_start_matches('@')
            .to_lowercase();
        if allowed_domain.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ALLOWED_EMAIL_DOMAIN".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client_id: get_required_env("GOOGLE_CLIENT_ID")?,
            allowed_domain,
        })
    }
}

impl WarehouseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let project_id = get_required_env("GOOGLE_PROJECT_ID")?;
        validate_project_id("GOOGLE_PROJECT_ID", &project_id)?;

        let credentials = load_credentials(
            get_optional_env("GOOGLE_APPLICATION_CREDENTIALS_JSON"),
            get_optional_env("GOOGLE_APPLICATION_CREDENTIALS"),
        )?;

        let defaults = OffersTable::default();
        let offers = OffersTable {
            dataset: get_identifier("OFFERS_DATASET", &defaults.dataset)?,
            table: get_identifier("OFFERS_TABLE", &defaults.table)?,
            vin_column: get_identifier("OFFERS_VIN_COLUMN", &defaults.vin_column)?,
            primary_column: get_identifier("OFFERS_PRIMARY_COLUMN", &defaults.primary_column)?,
            offers_column: get_identifier("OFFERS_LIST_COLUMN", &defaults.offers_column)?,
            status_column: get_identifier("OFFERS_STATUS_COLUMN", &defaults.status_column)?,
        };

        let usage_defaults = UsageTable::default();
        let timezone = match get_optional_env("USAGE_TIMEZONE") {
            Some(name) => name.parse::<Tz>().map_err(|e| {
                ConfigError::InvalidEnvVar("USAGE_TIMEZONE".to_string(), e.to_string())
            })?,
            None => usage_defaults.timezone,
        };
        let usage = UsageTable {
            dataset: get_identifier("USAGE_DATASET", &usage_defaults.dataset)?,
            table: get_identifier("USAGE_TABLE", &usage_defaults.table)?,
            timezone,
        };

        Ok(Self {
            project_id,
            credentials,
            offers,
            usage,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Normalize an origin (`scheme://host[:port]`) for CORS.
fn parse_origin(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "expected an http(s) origin".to_string(),
        ));
    }

    Ok(url.origin().ascii_serialization())
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a SQL identifier (dataset, table or column) with a default value.
fn get_identifier(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    validate_identifier(key, &value)?;
    Ok(value)
}

/// Identifiers are interpolated into SQL, so only plain names are accepted.
fn validate_identifier(key: &str, value: &str) -> Result<(), ConfigError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("'{value}' is not a valid identifier (letters, digits, '_' and '-' only)"),
        ))
    }
}

/// Project IDs may also carry a `domain.com:` prefix.
fn validate_project_id(key: &str, value: &str) -> Result<(), ConfigError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("'{value}' is not a valid project id"),
        ))
    }
}

/// Resolve the service account key. Inline JSON wins over a file path.
fn load_credentials(
    inline_json: Option<String>,
    key_file: Option<String>,
) -> Result<ServiceAccountKey, ConfigError> {
    if let Some(json) = inline_json {
        return ServiceAccountKey::from_json(&json).map_err(|e| {
            ConfigError::InvalidEnvVar(
                "GOOGLE_APPLICATION_CREDENTIALS_JSON".to_string(),
                format!("not a valid service account key: {e}"),
            )
        });
    }

    let path = key_file.ok_or_else(|| {
        ConfigError::MissingEnvVar(
            "GOOGLE_APPLICATION_CREDENTIALS or GOOGLE_APPLICATION_CREDENTIALS_JSON".to_string(),
        )
    })?;
    let json = std::fs::read_to_string(&path)
        .map_err(|e| ConfigError::Unreadable(path.clone(), e.to_string()))?;

    ServiceAccountKey::from_json(&json).map_err(|e| {
        ConfigError::InvalidEnvVar(
            "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            format!("{path} is not a valid service account key: {e}"),
        )
    })
}

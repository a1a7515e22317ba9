//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, framing, sniffing)
//! 5. CORS (only when `CORS_ORIGIN` is set)
//!
//! The access gate is not a layer: protected handlers take the
//! [`RequireIdentity`] extractor.

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::RequireIdentity;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;

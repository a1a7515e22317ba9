//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

use super::Email;

/// The caller behind a request that passed the access gate.
///
/// Only ever built from a verified token whose email matched the allowed
/// organizational domain. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Verified email address.
    pub email: Email,
    /// Display name from the identity provider (may be empty).
    pub name: String,
    /// Avatar URL from the identity provider.
    pub picture: Option<String>,
}

impl Identity {
    /// Name to show in the UI, falling back to a generic label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { "Usuario" } else { name }
    }
}

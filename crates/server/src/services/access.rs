//! Organizational access policy.
//!
//! Decides whether a verified token belongs to someone allowed to use the
//! tool. Token verification itself happens in [`crate::identity`].

use ofertas_vin_core::{Email, Identity};
use thiserror::Error;

use crate::identity::VerifiedClaims;

/// Reasons a request is turned away by the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No bearer token on the request.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The token could not be verified.
    #[error("invalid token")]
    InvalidToken,

    /// The account's email address is not verified.
    #[error("email not verified")]
    EmailNotVerified,

    /// Neither the email domain nor the hosted domain is the allowed one.
    #[error("domain not allowed")]
    DomainNotAllowed,
}

/// Apply the access policy to verified claims.
///
/// The caller is admitted when the email is verified and either the email's
/// domain or the hosted-domain claim equals `allowed_domain`, ignoring case.
///
/// # Errors
///
/// Returns `AuthError::EmailNotVerified` or `AuthError::DomainNotAllowed`
/// when the policy rejects the claims, and `AuthError::InvalidToken` if the
/// email claim is not a usable address.
pub fn authorize(claims: VerifiedClaims, allowed_domain: &str) -> Result<Identity, AuthError> {
    if !claims.email_verified {
        return Err(AuthError::EmailNotVerified);
    }

    let email = Email::parse(&claims.email).map_err(|_| AuthError::InvalidToken)?;

    let hosted_domain_matches = claims
        .hosted_domain
        .as_deref()
        .is_some_and(|hd| hd.trim().eq_ignore_ascii_case(allowed_domain));

    if !(email.belongs_to(allowed_domain) || hosted_domain_matches) {
        return Err(AuthError::DomainNotAllowed);
    }

    Ok(Identity {
        email,
        name: claims.name.unwrap_or_default(),
        picture: claims.picture.filter(|url| !url.trim().is_empty()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DOMAIN: &str = "grupogranauto.mx";

    fn claims(email: &str, verified: bool, hd: Option<&str>) -> VerifiedClaims {
        VerifiedClaims {
            email: email.to_string(),
            email_verified: verified,
            hosted_domain: hd.map(str::to_string),
            name: Some("Ana López".to_string()),
            picture: None,
        }
    }

    #[test]
    fn test_decision_table() {
        let cases: &[(&str, bool, Option<&str>, Result<(), AuthError>)] = &[
            ("ana@grupogranauto.mx", true, None, Ok(())),
            ("ana@grupogranauto.mx", true, Some("grupogranauto.mx"), Ok(())),
            ("Ana@GrupoGranAuto.MX", true, None, Ok(())),
            ("ana@gmail.com", true, Some("grupogranauto.mx"), Ok(())),
            ("ana@gmail.com", true, Some("GRUPOGRANAUTO.MX"), Ok(())),
            ("ana@grupogranauto.mx", false, Some("grupogranauto.mx"), Err(AuthError::EmailNotVerified)),
            ("ana@gmail.com", true, None, Err(AuthError::DomainNotAllowed)),
            ("ana@gmail.com", true, Some("otra.mx"), Err(AuthError::DomainNotAllowed)),
            ("ana@ventas.grupogranauto.mx", true, None, Err(AuthError::DomainNotAllowed)),
            ("ana@grupogranauto.mx.evil.com", true, None, Err(AuthError::DomainNotAllowed)),
            ("not-an-email", true, Some("grupogranauto.mx"), Err(AuthError::InvalidToken)),
        ];

        for (email, verified, hd, expected) in cases {
            let result = authorize(claims(email, *verified, *hd), DOMAIN).map(|_| ());
            assert_eq!(result, *expected, "email={email} verified={verified} hd={hd:?}");
        }
    }

    #[test]
    fn test_authorized_identity_carries_profile() {
        let mut input = claims("Ana@GrupoGranAuto.mx", true, None);
        input.picture = Some("https://lh3.googleusercontent.com/a/photo".to_string());

        let identity = authorize(input, DOMAIN).unwrap();
        assert_eq!(identity.email.as_str(), "ana@grupogranauto.mx");
        assert_eq!(identity.name, "Ana López");
        assert_eq!(
            identity.picture.as_deref(),
            Some("https://lh3.googleusercontent.com/a/photo")
        );
    }

    #[test]
    fn test_missing_name_is_empty() {
        let mut input = claims("ana@grupogranauto.mx", true, None);
        input.name = None;
        let identity = authorize(input, DOMAIN).unwrap();
        assert_eq!(identity.display_name(), "Usuario");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AuthError::NotAuthenticated.to_string(), "not authenticated");
        assert_eq!(AuthError::InvalidToken.to_string(), "invalid token");
        assert_eq!(AuthError::EmailNotVerified.to_string(), "email not verified");
        assert_eq!(AuthError::DomainNotAllowed.to_string(), "domain not allowed");
    }
}

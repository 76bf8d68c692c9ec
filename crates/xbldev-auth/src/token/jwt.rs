//! Unverified JWT payload inspection.
//!
//! Only used to read expiry and display claims from tokens the caller
//! already trusts. Signatures are not checked.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::IdentityClaims;
use crate::error::{Error, Result};

/// Subset of registered and directory claims read from a JWT payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtClaims {
    /// Expiry (seconds since epoch).
    pub exp: Option<i64>,
    /// Issue time (seconds since epoch).
    pub iat: Option<i64>,
    /// Display name.
    pub name: Option<String>,
    /// Object id of the signed-in principal.
    pub oid: Option<String>,
    /// User principal name.
    pub upn: Option<String>,
    /// Preferred user name (v2 tokens).
    pub preferred_username: Option<String>,
}

impl JwtClaims {
    /// Decodes the payload segment of a compact JWT.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] if the token is not a JWT.
    pub fn decode(token: &str) -> Result<Self> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| Error::InvalidCredential("token is not a JWT".into()))?;

        // Some issuers pad the segment anyway
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::InvalidCredential(format!("JWT payload is not base64url: {e}")))?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Issue time as a timestamp.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Maps directory claims to identity claims.
    #[must_use]
    pub fn identity(&self) -> IdentityClaims {
        IdentityClaims {
            display_name: self.name.clone(),
            account_id: self.oid.clone(),
            account_type: None,
            moniker: self.upn.clone().or_else(|| self.preferred_username.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_claims() {
        let token = encode(
            r#"{"exp":1900000000,"iat":1899996400,"name":"Dev One","oid":"abc","upn":"dev@contoso.com"}"#,
        );
        let claims = JwtClaims::decode(&token).unwrap();

        assert_eq!(claims.exp, Some(1_900_000_000));
        assert!(claims.expires_at().unwrap() > claims.issued_at().unwrap());

        let identity = claims.identity();
        assert_eq!(identity.display_name.as_deref(), Some("Dev One"));
        assert_eq!(identity.account_id.as_deref(), Some("abc"));
        assert_eq!(identity.moniker.as_deref(), Some("dev@contoso.com"));
    }

    #[test]
    fn test_preferred_username_fallback() {
        let token = encode(r#"{"preferred_username":"dev@contoso.com"}"#);
        let identity = JwtClaims::decode(&token).unwrap().identity();
        assert_eq!(identity.moniker.as_deref(), Some("dev@contoso.com"));
    }

    #[test]
    fn test_rejects_opaque_token() {
        assert!(matches!(
            JwtClaims::decode("opaque-token"),
            Err(Error::InvalidCredential(_))
        ));
    }
}

//! Pre-issued token supplied by the caller.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::{AccountSource, IdentityProvider};
use crate::error::{Error, Result};
use crate::token::{Credential, IdentityClaims, JwtClaims, TokenKey};

/// Environment variable read by [`StaticTokenIdentity::from_env`].
pub const TOKEN_ENV_VAR: &str = "XBLDEV_TOKEN";

/// Serves one caller-supplied token for every key.
///
/// The token cannot be renewed: once it expires, silent acquisition fails
/// with [`Error::NoCachedIdentity`].
#[derive(Debug, Clone)]
pub struct StaticTokenIdentity {
    token: String,
    issued_at: DateTime<Utc>,
    not_after: DateTime<Utc>,
    claims: IdentityClaims,
}

impl StaticTokenIdentity {
    /// Wraps a token with a known lifetime.
    #[must_use]
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            issued_at,
            not_after,
            claims: IdentityClaims::default(),
        }
    }

    /// Attaches identity claims to every credential served.
    #[must_use]
    pub fn with_claims(mut self, claims: IdentityClaims) -> Self {
        self.claims = claims;
        self
    }

    /// Builds a provider from a JWT, reading lifetime and claims from its
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] if the token is not a JWT or
    /// carries no expiry.
    pub fn from_jwt(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let claims = JwtClaims::decode(&token)?;
        let not_after = claims
            .expires_at()
            .ok_or_else(|| Error::InvalidCredential("JWT has no exp claim".into()))?;
        let issued_at = claims
            .issued_at()
            .unwrap_or_else(|| not_after - Duration::hours(1));

        Ok(Self::new(token, issued_at, not_after).with_claims(claims.identity()))
    }

    /// Reads the token from [`TOKEN_ENV_VAR`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the variable is unset, or the
    /// errors of [`Self::from_jwt`].
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV_VAR)
            .map_err(|_| Error::InvalidConfig(format!("{TOKEN_ENV_VAR} is not set")))?;
        Self::from_jwt(token.trim())
    }

    fn credential(&self, key: &TokenKey) -> Result<Credential> {
        Ok(
            Credential::new(key.clone(), self.token.clone(), self.issued_at, self.not_after)?
                .with_claims(self.claims.clone()),
        )
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    fn source(&self) -> AccountSource {
        AccountSource::StaticToken
    }

    async fn acquire_interactive(&self, _user_hint: Option<&str>) -> Result<Credential> {
        let credential = self.credential(&TokenKey::default())?;
        if !credential.is_valid() {
            return Err(Error::AuthenticationFailed(format!(
                "supplied token expired at {}",
                self.not_after
            )));
        }
        Ok(credential)
    }

    async fn acquire_silent(&self, key: &TokenKey) -> Result<Credential> {
        let credential = self.credential(key)?;
        if !credential.is_valid() {
            debug!("Supplied token expired at {}", self.not_after);
            return Err(Error::NoCachedIdentity);
        }
        Ok(credential)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[tokio::test]
    async fn test_serves_token_for_any_key() {
        let now = Utc::now();
        let identity = StaticTokenIdentity::new("tok", now, now + Duration::hours(1));

        let key = TokenKey::new("scid", "XDKS.1");
        let credential = identity.acquire_silent(&key).await.unwrap();
        assert_eq!(credential.subject(), &key);
        assert_eq!(credential.token(), "tok");
    }

    #[tokio::test]
    async fn test_expired_token() {
        let now = Utc::now();
        let identity =
            StaticTokenIdentity::new("tok", now - Duration::hours(2), now - Duration::hours(1));

        assert!(matches!(
            identity.acquire_silent(&TokenKey::default()).await,
            Err(Error::NoCachedIdentity)
        ));
        assert!(matches!(
            identity.acquire_interactive(None).await,
            Err(Error::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_from_jwt_reads_lifetime() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"exp":4102444800,"name":"CI Runner"}"#);
        let identity = StaticTokenIdentity::from_jwt(format!("h.{payload}.s")).unwrap();

        assert_eq!(identity.not_after.timestamp(), 4_102_444_800);
        assert_eq!(identity.claims.display_name.as_deref(), Some("CI Runner"));
    }

    #[test]
    fn test_from_jwt_requires_exp() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"name":"CI Runner"}"#);
        assert!(StaticTokenIdentity::from_jwt(format!("h.{payload}.s")).is_err());
    }
}

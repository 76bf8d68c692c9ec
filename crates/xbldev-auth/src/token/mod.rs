//! Xbox Live credential types.

mod jwt;

pub use jwt::JwtClaims;

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Clock-skew margin applied when checking whether a credential is still usable.
pub const CLOCK_SKEW_SECS: i64 = 5;

/// Cache key for a credential: one service configuration id in one sandbox.
///
/// The empty key (`TokenKey::default()`) names the default credential that is
/// not bound to any title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenKey {
    /// Service configuration id.
    pub scid: String,
    /// Sandbox id.
    pub sandbox: String,
}

impl TokenKey {
    /// Creates a key for a title in a sandbox.
    #[must_use]
    pub fn new(scid: impl Into<String>, sandbox: impl Into<String>) -> Self {
        Self {
            scid: scid.into(),
            sandbox: sandbox.into(),
        }
    }

    /// Returns true for the default (title-less) key.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.scid.is_empty() && self.sandbox.is_empty()
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            f.write_str("<default>")
        } else {
            write!(f, "{}/{}", self.scid, self.sandbox)
        }
    }
}

/// Identity claims carried alongside a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Display name of the signed-in developer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Account identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Raw account type claim (e.g. `Publisher`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    /// Sign-in name (usually an e-mail address).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moniker: Option<String>,
}

impl IdentityClaims {
    /// Fills any missing claim from `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            display_name: self.display_name.or(other.display_name),
            account_id: self.account_id.or(other.account_id),
            account_type: self.account_type.or(other.account_type),
            moniker: self.moniker.or(other.moniker),
        }
    }
}

/// A bearer credential issued for one [`TokenKey`].
///
/// Credentials are immutable; a refresh produces a new value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    subject: TokenKey,
    token: String,
    issued_at: DateTime<Utc>,
    not_after: DateTime<Utc>,
    #[serde(default)]
    claims: IdentityClaims,
}

impl Credential {
    /// Creates a credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] unless `not_after > issued_at`.
    pub fn new(
        subject: TokenKey,
        token: impl Into<String>,
        issued_at: DateTime<Utc>,
        not_after: DateTime<Utc>,
    ) -> Result<Self> {
        if not_after <= issued_at {
            return Err(Error::InvalidCredential(format!(
                "credential for {subject} expires ({not_after}) before it is issued ({issued_at})"
            )));
        }

        Ok(Self {
            subject,
            token: token.into(),
            issued_at,
            not_after,
            claims: IdentityClaims::default(),
        })
    }

    /// Attaches identity claims.
    #[must_use]
    pub fn with_claims(mut self, claims: IdentityClaims) -> Self {
        self.claims = claims;
        self
    }

    /// Key this credential was issued for.
    #[must_use]
    pub const fn subject(&self) -> &TokenKey {
        &self.subject
    }

    /// Raw token value.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Issue time.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Expiry time.
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Identity claims returned with the credential.
    #[must_use]
    pub const fn claims(&self) -> &IdentityClaims {
        &self.claims
    }

    /// Checks validity at `now`, keeping [`CLOCK_SKEW_SECS`] in reserve.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.not_after - Duration::seconds(CLOCK_SKEW_SECS)
    }

    /// Returns true if the credential can still be presented.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("subject", &self.subject)
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("not_after", &self.not_after)
            .field("claims", &self.claims)
            .finish()
    }
}

//! Identity back-ends.
//!
//! The token store and session only see the [`IdentityProvider`] trait.
//! The account source in configuration picks the implementation:
//!
//! - [`AccountSource::DevCenter`]: [`DeviceCodeIdentity`], interactive
//!   device-code sign-in against the directory, then exchange for Xbox
//!   developer tokens.
//! - [`AccountSource::StaticToken`]: [`StaticTokenIdentity`], a pre-issued
//!   token (CI machines, scripted runs).

mod device;
mod static_token;

pub use device::{DeviceCodeIdentity, DevicePrompt};
pub use static_token::StaticTokenIdentity;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::token::{Credential, TokenKey};

/// Where the developer account comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountSource {
    /// Partner Center / Dev Center account via directory sign-in.
    #[default]
    DevCenter,
    /// Pre-issued token supplied by the environment.
    StaticToken,
}

impl AccountSource {
    /// Stable name used in configuration and keyring entries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DevCenter => "dev-center",
            Self::StaticToken => "static-token",
        }
    }
}

impl fmt::Display for AccountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev-center" | "devcenter" | "windowsdevcenter" => Ok(Self::DevCenter),
            "static-token" | "statictoken" | "token" => Ok(Self::StaticToken),
            other => Err(Error::InvalidConfig(format!("unknown account source '{other}'"))),
        }
    }
}

/// Identity back-end contract.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Account source this provider implements.
    fn source(&self) -> AccountSource;

    /// Signs the developer in, prompting if needed. Returns the default
    /// credential.
    ///
    /// # Errors
    ///
    /// [`Error::AuthenticationFailed`] when credentials are rejected, a
    /// transport error when the back-end is unreachable.
    async fn acquire_interactive(&self, user_hint: Option<&str>) -> Result<Credential>;

    /// Acquires a credential for `key` without user interaction.
    ///
    /// # Errors
    ///
    /// [`Error::NoCachedIdentity`] when nobody has signed in.
    async fn acquire_silent(&self, key: &TokenKey) -> Result<Credential>;

    /// Drops any persisted identity.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be removed.
    async fn forget(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_round_trip() {
        for source in [AccountSource::DevCenter, AccountSource::StaticToken] {
            assert_eq!(source.as_str().parse::<AccountSource>().unwrap(), source);
        }
        assert_eq!(
            "WindowsDevCenter".parse::<AccountSource>().unwrap(),
            AccountSource::DevCenter
        );
        assert!("xbox".parse::<AccountSource>().is_err());
    }

    #[test]
    fn test_source_serde_name() {
        let json = serde_json::to_string(&AccountSource::StaticToken).unwrap();
        assert_eq!(json, "\"static-token\"");
    }
}

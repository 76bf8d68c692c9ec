//! Developer account session.
//!
//! ```text
//! ┌────────────┐  sign_in / resume  ┌────────────┐
//! │ SignedOut  │ ─────────────────→ │  SignedIn  │ ── sign_in (replace)
//! └────────────┘ ←───────────────── └────────────┘
//!                     sign_out
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Error, Result};
use crate::header::authorization_value;
use crate::provider::{AccountSource, IdentityProvider};
use crate::store::TokenStore;
use crate::token::{IdentityClaims, TokenKey};

/// Developer account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccountType {
    /// Type not reported.
    #[default]
    Unknown,
    /// Individual developer.
    Individual,
    /// Enterprise developer.
    Enterprise,
    /// Publisher account; may run batch work concurrently.
    Publisher,
}

impl AccountType {
    /// Parses the account type claim; unknown values map to `Unknown`.
    #[must_use]
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim.map(str::to_ascii_lowercase).as_deref() {
            Some("individual") => Self::Individual,
            Some("enterprise") => Self::Enterprise,
            Some("publisher") => Self::Publisher,
            _ => Self::Unknown,
        }
    }

    /// Returns true for accounts allowed to overlap batch work.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Publisher)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Individual => "Individual",
            Self::Enterprise => "Enterprise",
            Self::Publisher => "Publisher",
        };
        f.write_str(name)
    }
}

/// The signed-in developer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedAccount {
    /// Display name.
    pub display_name: String,
    /// Account identifier.
    pub account_id: String,
    /// Account type.
    pub account_type: AccountType,
    /// Where the account comes from.
    pub account_source: AccountSource,
    /// Sign-in name.
    pub account_moniker: String,
}

impl AuthenticatedAccount {
    fn from_claims(source: AccountSource, user_hint: Option<&str>, claims: IdentityClaims) -> Self {
        let account_moniker = claims
            .moniker
            .or_else(|| user_hint.map(ToString::to_string))
            .unwrap_or_default();

        Self {
            display_name: claims
                .display_name
                .unwrap_or_else(|| account_moniker.clone()),
            account_id: claims.account_id.unwrap_or_default(),
            account_type: AccountType::from_claim(claims.account_type.as_deref()),
            account_source: source,
            account_moniker,
        }
    }
}

/// Current-account state plus the credential cache.
///
/// Create one per process and pass it to whatever needs authorization.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    store: TokenStore,
    current: RwLock<Option<AuthenticatedAccount>>,
}

impl AuthSession {
    /// Creates a signed-out session.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store: TokenStore::new(Arc::clone(&provider)),
            provider,
            current: RwLock::new(None),
        }
    }

    /// Credential cache backing this session.
    #[must_use]
    pub const fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Signs in interactively, replacing any current account.
    ///
    /// After the interactive step a silent acquisition through the token store
    /// reads the account's display claims.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error; the previous account stays signed
    /// in if sign-in fails.
    pub async fn sign_in(&self, user_hint: Option<&str>) -> Result<AuthenticatedAccount> {
        let interactive = self.provider.acquire_interactive(user_hint).await?;

        // Tokens cached for a previous account must not leak into this one
        self.store.evict_all().await;

        let default_credential = self
            .store
            .get_or_refresh(&TokenKey::default(), false)
            .await?;
        let claims = default_credential.claims().clone().or(interactive.claims().clone());

        let account = AuthenticatedAccount::from_claims(self.provider.source(), user_hint, claims);
        info!(
            account = %account.account_moniker,
            source = %account.account_source,
            "Signed in"
        );

        *self.current.write().await = Some(account.clone());
        Ok(account)
    }

    /// Restores a previously signed-in account without prompting.
    pub async fn resume(&self, account: AuthenticatedAccount) {
        *self.current.write().await = Some(account);
    }

    /// Signs out and evicts every cached credential.
    ///
    /// # Errors
    ///
    /// [`Error::NoAccount`] when already signed out.
    pub async fn sign_out(&self) -> Result<AuthenticatedAccount> {
        let account = self.current.write().await.take().ok_or(Error::NoAccount)?;
        self.store.evict_all().await;
        self.provider.forget().await?;
        info!(account = %account.account_moniker, "Signed out");
        Ok(account)
    }

    /// The signed-in account, if any.
    pub async fn current(&self) -> Option<AuthenticatedAccount> {
        self.current.read().await.clone()
    }

    /// Produces the `Authorization` value for a title in a sandbox,
    /// refreshing the underlying credential if needed.
    ///
    /// # Errors
    ///
    /// [`Error::NotSignedIn`] when signed out, or the provider's error.
    pub async fn authorization_header(&self, scid: &str, sandbox: &str) -> Result<String> {
        if self.current.read().await.is_none() {
            return Err(Error::NotSignedIn);
        }

        let credential = self
            .store
            .get_or_refresh(&TokenKey::new(scid, sandbox), false)
            .await?;
        Ok(authorization_value(credential.token()))
    }
}

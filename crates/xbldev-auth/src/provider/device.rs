//! Device-code sign-in backed by the developer token service.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AccountSource, IdentityProvider};
use crate::error::{Error, Result};
use crate::exchange::TokenService;
use crate::flow::{DeviceAuthorization, DeviceFlow, DirectoryToken};
use crate::keychain::Keychain;
use crate::token::{Credential, IdentityClaims, JwtClaims, TokenKey};

/// Callback that shows the user code and verification URI.
pub type DevicePrompt = Box<dyn Fn(&DeviceAuthorization) + Send + Sync>;

/// Interactive directory sign-in with silent refresh.
///
/// The directory token is held in memory and, when a [`Keychain`] is
/// configured, in the system keyring so later processes can sign in
/// silently.
pub struct DeviceCodeIdentity {
    flow: DeviceFlow,
    service: TokenService,
    keychain: Option<Keychain>,
    directory: Mutex<Option<DirectoryToken>>,
    prompt: DevicePrompt,
}

impl DeviceCodeIdentity {
    /// Creates a provider from a device flow and a token service client.
    #[must_use]
    pub fn new(flow: DeviceFlow, service: TokenService) -> Self {
        Self {
            flow,
            service,
            keychain: None,
            directory: Mutex::new(None),
            prompt: Box::new(|auth| {
                info!(
                    "Visit {} and enter code {}",
                    auth.verification_uri, auth.user_code
                );
            }),
        }
    }

    /// Persists the directory sign-in in the keyring.
    #[must_use]
    pub fn with_keychain(mut self, keychain: Keychain) -> Self {
        self.keychain = Some(keychain);
        self
    }

    /// Replaces the user-code prompt.
    #[must_use]
    pub fn with_prompt(
        mut self,
        prompt: impl Fn(&DeviceAuthorization) + Send + Sync + 'static,
    ) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    fn persist(&self, token: &DirectoryToken) {
        if let Some(keychain) = &self.keychain {
            // A keyring failure only costs the next process a prompt
            if let Err(e) = keychain.store(token) {
                warn!("Could not persist directory sign-in: {e}");
            }
        }
    }

    /// Returns a usable directory token, refreshing it if it expired.
    async fn directory_token(&self) -> Result<DirectoryToken> {
        let mut slot = self.directory.lock().await;

        if slot.is_none() {
            if let Some(keychain) = &self.keychain {
                *slot = keychain.load()?;
            }
        }

        let current = slot.as_ref().ok_or(Error::NoCachedIdentity)?;
        if !current.is_expired() {
            return Ok(current.clone());
        }

        debug!("Directory token expired; refreshing");
        let refreshed = match self.flow.client().refresh_token(current).await {
            Ok(token) => token,
            Err(Error::NoRefreshToken) => return Err(Error::NoCachedIdentity),
            Err(e) => return Err(e),
        };
        self.persist(&refreshed);
        *slot = Some(refreshed.clone());
        Ok(refreshed)
    }

    async fn exchange(&self, directory: &DirectoryToken, key: &TokenKey) -> Result<Credential> {
        let credential = self.service.exchange(&directory.access_token, key).await?;

        let id_claims = directory
            .id_token
            .as_deref()
            .and_then(|id| JwtClaims::decode(id).ok())
            .map(|claims| claims.identity())
            .unwrap_or_default();

        let claims: IdentityClaims = credential.claims().clone().or(id_claims);
        Ok(credential.with_claims(claims))
    }
}

#[async_trait]
impl IdentityProvider for DeviceCodeIdentity {
    fn source(&self) -> AccountSource {
        AccountSource::DevCenter
    }

    async fn acquire_interactive(&self, user_hint: Option<&str>) -> Result<Credential> {
        let auth = self.flow.request_device_authorization(user_hint).await?;
        (self.prompt)(&auth);

        let directory = self.flow.wait_for_token(&auth).await.map_err(|e| match e {
            Error::AccessDenied => Error::AuthenticationFailed("sign-in was declined".into()),
            other => other,
        })?;

        self.persist(&directory);
        *self.directory.lock().await = Some(directory.clone());

        self.exchange(&directory, &TokenKey::default()).await
    }

    async fn acquire_silent(&self, key: &TokenKey) -> Result<Credential> {
        let directory = self.directory_token().await?;
        self.exchange(&directory, key).await
    }

    async fn forget(&self) -> Result<()> {
        *self.directory.lock().await = None;
        if let Some(keychain) = &self.keychain {
            keychain.delete()?;
        }
        Ok(())
    }
}

//! Keyed credential cache with refresh-if-needed.
//!
//! One entry per [`TokenKey`]. Each key has its own async lock, so a slow
//! refresh for one title never holds up callers for another, while callers
//! racing on the same key wait for the refresh in flight and then reuse its
//! result instead of issuing their own.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::provider::IdentityProvider;
use crate::token::{Credential, TokenKey};

type Slot = Arc<Mutex<Option<Credential>>>;

/// Credential cache keyed by (service id, sandbox).
pub struct TokenStore {
    provider: Arc<dyn IdentityProvider>,
    slots: Mutex<HashMap<TokenKey, Slot>>,
}

impl TokenStore {
    /// Creates an empty store backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, key: &TokenKey) -> Slot {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Returns the cached credential for `key` if it is still valid,
    /// otherwise acquires and caches a fresh one.
    ///
    /// A failed acquisition caches nothing and leaves the previous entry in
    /// place.
    ///
    /// # Errors
    ///
    /// Propagates the identity provider's error.
    pub async fn get_or_refresh(&self, key: &TokenKey, force_refresh: bool) -> Result<Credential> {
        let slot = self.slot(key).await;
        let mut entry = slot.lock().await;

        if !force_refresh {
            if let Some(credential) = entry.as_ref().filter(|c| c.is_valid()) {
                return Ok(credential.clone());
            }
        }

        debug!(key = %key, force_refresh, "Acquiring credential");
        let fresh = self.provider.acquire_silent(key).await?;
        if fresh.subject() != key {
            warn!(key = %key, subject = %fresh.subject(), "Provider returned a credential for another key");
        }

        *entry = Some(fresh.clone());
        Ok(fresh)
    }

    /// Seeds the entry for the credential's own key.
    pub async fn insert(&self, credential: Credential) {
        let slot = self.slot(credential.subject()).await;
        *slot.lock().await = Some(credential);
    }

    /// Returns the cached credential for `key` without refreshing.
    pub async fn cached(&self, key: &TokenKey) -> Option<Credential> {
        let slot = self.slots.lock().await.get(key).cloned()?;
        let entry = slot.lock().await;
        entry.clone()
    }

    /// Drops every cached credential.
    ///
    /// Slots stay in place, so a refresh in flight is awaited and then
    /// cleared, and later callers for the same key still queue behind it.
    pub async fn evict_all(&self) {
        let slots = self.snapshot().await;
        debug!(entries = slots.len(), "Evicting cached credentials");
        for slot in slots {
            *slot.lock().await = None;
        }
    }

    /// Number of cached credentials.
    pub async fn len(&self) -> usize {
        let mut count = 0;
        for slot in self.snapshot().await {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    /// Returns true if no credential is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn snapshot(&self) -> Vec<Slot> {
        self.slots.lock().await.values().cloned().collect()
    }
}

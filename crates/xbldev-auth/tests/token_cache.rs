//! Integration tests for the credential cache and session.
//!
//! A scripted identity provider stands in for the directory and token
//! service and records every back-end call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_test::{assert_err, assert_ok};

use xbldev_auth::{
    AccountSource, AccountType, AuthSession, Credential, Error, IdentityClaims, IdentityProvider,
    Result, TokenKey, TokenStore,
};

/// Scripted provider.
struct FakeProvider {
    /// Silent calls per key.
    calls: Mutex<HashMap<TokenKey, usize>>,
    /// Lifetime of issued credentials.
    lifetime: Duration,
    /// Silent calls for this key wait until notified.
    gate: Option<(TokenKey, Arc<Notify>)>,
    /// Artificial latency for every silent call.
    latency: StdDuration,
    claims: IdentityClaims,
    reject_interactive: bool,
}

impl FakeProvider {
    fn new(lifetime: Duration) -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            lifetime,
            gate: None,
            latency: StdDuration::ZERO,
            claims: IdentityClaims::default(),
            reject_interactive: false,
        }
    }

    fn calls_for(&self, key: &TokenKey) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn source(&self) -> AccountSource {
        AccountSource::DevCenter
    }

    async fn acquire_interactive(&self, _user_hint: Option<&str>) -> Result<Credential> {
        if self.reject_interactive {
            return Err(Error::AuthenticationFailed("bad password".into()));
        }
        let now = Utc::now();
        Credential::new(TokenKey::default(), "interactive", now, now + self.lifetime)
    }

    async fn acquire_silent(&self, key: &TokenKey) -> Result<Credential> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(key.clone()).or_default();
            *count += 1;
            *count
        };

        if let Some((gated, notify)) = &self.gate {
            if gated == key {
                notify.notified().await;
            }
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let now = Utc::now();
        Ok(Credential::new(
            key.clone(),
            format!("{key}#{n}"),
            now - Duration::minutes(1),
            now + self.lifetime,
        )?
        .with_claims(self.claims.clone()))
    }
}

fn title_key() -> TokenKey {
    TokenKey::new("00000000-0000-0000-0000-00006e9a2b3c", "XDKS.1")
}

#[tokio::test]
async fn test_valid_credential_is_reused() {
    let provider = Arc::new(FakeProvider::new(Duration::hours(1)));
    let store = TokenStore::new(provider.clone());
    let key = title_key();

    let first = store.get_or_refresh(&key, false).await.unwrap();
    let second = store.get_or_refresh(&key, false).await.unwrap();

    assert_eq!(provider.calls_for(&key), 1);
    assert_eq!(first.token(), second.token());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expired_credential_is_refreshed_once() {
    let provider = Arc::new(FakeProvider::new(Duration::hours(1)));
    let store = TokenStore::new(provider.clone());
    let key = title_key();

    let now = Utc::now();
    let expired = Credential::new(key.clone(), "expired", now - Duration::hours(1), now).unwrap();
    store.insert(expired).await;

    let refreshed = store.get_or_refresh(&key, false).await.unwrap();

    assert_eq!(provider.calls_for(&key), 1);
    assert_ne!(refreshed.token(), "expired");
    assert!(refreshed.is_valid());
}

#[tokio::test]
async fn test_keys_are_isolated() {
    let provider = Arc::new(FakeProvider::new(Duration::hours(1)));
    let store = TokenStore::new(provider.clone());
    let a = TokenKey::new("scid-a", "XDKS.1");
    let b = TokenKey::new("scid-b", "XDKS.1");

    store.get_or_refresh(&a, false).await.unwrap();
    store.get_or_refresh(&a, false).await.unwrap();
    assert_eq!(provider.calls_for(&a), 1);
    assert_eq!(provider.calls_for(&b), 0);

    let credential = store.get_or_refresh(&b, false).await.unwrap();
    assert_eq!(credential.subject(), &b);
    assert_eq!(provider.calls_for(&a), 1);
    assert_eq!(provider.calls_for(&b), 1);
}

#[tokio::test]
async fn test_slow_refresh_does_not_block_other_keys() {
    let notify = Arc::new(Notify::new());
    let slow = TokenKey::new("slow", "XDKS.1");
    let mut provider = FakeProvider::new(Duration::hours(1));
    provider.gate = Some((slow.clone(), Arc::clone(&notify)));
    let store = Arc::new(TokenStore::new(Arc::new(provider)));

    let pending = {
        let store = Arc::clone(&store);
        let slow = slow.clone();
        tokio::spawn(async move { store.get_or_refresh(&slow, false).await })
    };
    tokio::task::yield_now().await;

    let other = tokio::time::timeout(
        StdDuration::from_secs(5),
        store.get_or_refresh(&TokenKey::new("fast", "XDKS.1"), false),
    )
    .await;
    assert!(other.is_ok(), "unrelated key waited on a refresh in flight");
    assert_ok!(other.unwrap());

    notify.notify_one();
    let slow_result = pending.await.unwrap().unwrap();
    assert_eq!(slow_result.subject(), &slow);
}

#[tokio::test]
async fn test_same_key_refreshes_coalesce() {
    let mut provider = FakeProvider::new(Duration::hours(1));
    provider.latency = StdDuration::from_millis(50);
    let provider = Arc::new(provider);
    let store = Arc::new(TokenStore::new(provider.clone()));
    let key = title_key();

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        let key = key.clone();
        tasks.spawn(async move { store.get_or_refresh(&key, false).await });
    }

    let mut tokens = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        tokens.push(joined.unwrap().unwrap().token().to_string());
    }

    assert_eq!(provider.calls_for(&key), 1);
    assert!(tokens.iter().all(|t| t == &tokens[0]));
}

#[tokio::test]
async fn test_eviction_during_refresh_keeps_same_key_queued() {
    let notify = Arc::new(Notify::new());
    let key = title_key();
    let mut provider = FakeProvider::new(Duration::hours(1));
    provider.gate = Some((key.clone(), Arc::clone(&notify)));
    let provider = Arc::new(provider);
    let store = Arc::new(TokenStore::new(provider.clone()));

    let spawn_refresh = || {
        let store = Arc::clone(&store);
        let key = key.clone();
        tokio::spawn(async move { store.get_or_refresh(&key, false).await })
    };

    let first = spawn_refresh();
    tokio::task::yield_now().await;
    let evict = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.evict_all().await })
    };
    tokio::task::yield_now().await;
    let second = spawn_refresh();
    tokio::task::yield_now().await;

    // The second caller waits behind the refresh in flight
    assert_eq!(provider.calls_for(&key), 1);

    notify.notify_one();
    assert_eq!(first.await.unwrap().unwrap().token(), format!("{key}#1"));
    evict.await.unwrap();

    notify.notify_one();
    let second = second.await.unwrap().unwrap();
    assert_eq!(second.token(), format!("{key}#2"));
    assert_eq!(store.cached(&key).await, Some(second));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_session_state_machine() {
    let mut provider = FakeProvider::new(Duration::hours(1));
    provider.claims = IdentityClaims {
        display_name: Some("Dev One".into()),
        account_id: Some("1234".into()),
        account_type: Some("Publisher".into()),
        moniker: Some("dev@contoso.com".into()),
    };
    let provider = Arc::new(provider);
    let session = AuthSession::new(provider.clone());

    assert!(session.current().await.is_none());
    assert!(matches!(
        session.authorization_header("scid", "XDKS.1").await,
        Err(Error::NotSignedIn)
    ));
    assert!(matches!(session.sign_out().await, Err(Error::NoAccount)));

    let account = session.sign_in(Some("dev@contoso.com")).await.unwrap();
    assert_eq!(account.display_name, "Dev One");
    assert_eq!(account.account_type, AccountType::Publisher);
    assert_eq!(session.current().await, Some(account.clone()));
    assert_eq!(provider.calls_for(&TokenKey::default()), 1);

    let header = session.authorization_header("scid", "XDKS.1").await.unwrap();
    assert!(header.starts_with("XBL3.0 x=-;"));
    assert!(header.ends_with("scid/XDKS.1#1"));

    let signed_out = session.sign_out().await.unwrap();
    assert_eq!(signed_out, account);
    assert!(session.current().await.is_none());
    assert!(session.store().is_empty().await);
}

#[tokio::test]
async fn test_re_sign_in_replaces_account_and_cache() {
    let provider = Arc::new(FakeProvider::new(Duration::hours(1)));
    let session = AuthSession::new(provider.clone());

    session.sign_in(Some("first@contoso.com")).await.unwrap();
    session.authorization_header("scid", "XDKS.1").await.unwrap();

    let second = session.sign_in(Some("second@contoso.com")).await.unwrap();
    assert_eq!(second.account_moniker, "second@contoso.com");

    // Cache was evicted, so the title token is acquired again
    session.authorization_header("scid", "XDKS.1").await.unwrap();
    assert_eq!(provider.calls_for(&TokenKey::new("scid", "XDKS.1")), 2);
}

#[tokio::test]
async fn test_rejected_sign_in_stays_signed_out() {
    let mut provider = FakeProvider::new(Duration::hours(1));
    provider.reject_interactive = true;
    let provider = Arc::new(provider);
    let session = AuthSession::new(provider.clone());

    let result = session.sign_in(None).await;
    assert!(matches!(result, Err(Error::AuthenticationFailed(_))));
    assert!(session.current().await.is_none());
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn test_resumed_session_acquires_silently() {
    let provider = Arc::new(FakeProvider::new(Duration::hours(1)));
    let session = AuthSession::new(provider.clone());
    assert_err!(session.authorization_header("scid", "XDKS.1").await);

    session
        .resume(xbldev_auth::AuthenticatedAccount {
            display_name: "Dev One".into(),
            account_id: "1234".into(),
            account_type: AccountType::Enterprise,
            account_source: AccountSource::DevCenter,
            account_moniker: "dev@contoso.com".into(),
        })
        .await;

    assert_ok!(session.authorization_header("scid", "XDKS.1").await);
    assert_eq!(provider.total_calls(), 1);
}

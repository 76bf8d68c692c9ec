//! Configuration and the persisted signed-in account.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;
use xbldev_auth::exchange::DEFAULT_TOKEN_SERVICE_URL;
use xbldev_auth::{AccountSource, AuthenticatedAccount};
use xbldev_core::contract::DEFAULT_JOB_SERVICE_URL;

const CONFIG_FILE: &str = "config.json";
const ACCOUNT_FILE: &str = "account.json";

/// Where configuration files live.
#[derive(Debug, Clone)]
pub struct Paths {
    dir: PathBuf,
}

impl Paths {
    /// Uses `dir` if given, else `<config dir>/xbldev`.
    pub fn resolve(dir: Option<PathBuf>) -> Self {
        let dir = dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("xbldev")
        });
        Self { dir }
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn account_file(&self) -> PathBuf {
        self.dir.join(ACCOUNT_FILE)
    }
}

/// User configuration. Every field has a default, so a missing or partial
/// file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account source used when `signin` is given none.
    pub account_source: AccountSource,
    /// Directory application (client) id for device sign-in.
    pub client_id: Option<String>,
    /// Directory tenant.
    pub tenant: String,
    /// Developer token service endpoint.
    pub token_service_url: Url,
    /// Player data reset service.
    pub job_service_url: Url,
    /// Delay between job status requests, in milliseconds.
    pub poll_interval_ms: u64,
    /// Batch chunks in flight at once for publisher accounts.
    pub batch_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_source: AccountSource::default(),
            client_id: None,
            tenant: "organizations".to_string(),
            token_service_url: builtin_url(DEFAULT_TOKEN_SERVICE_URL),
            job_service_url: builtin_url(DEFAULT_JOB_SERVICE_URL),
            poll_interval_ms: 3000,
            batch_concurrency: 4,
        }
    }
}

fn builtin_url(url: &str) -> Url {
    Url::parse(url).unwrap_or_else(|e| unreachable!("built-in URL {url} is invalid: {e}"))
}

impl Config {
    /// Loads the configuration, falling back to defaults if the file is
    /// missing.
    pub async fn load(paths: &Paths) -> Result<Self> {
        let path = paths.config_file();
        match read_optional(&path).await? {
            Some(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("invalid configuration in {}", path.display())),
            None => Ok(Self::default()),
        }
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Reads the account saved by the last sign-in.
pub async fn load_account(paths: &Paths) -> Result<Option<AuthenticatedAccount>> {
    let path = paths.account_file();
    let Some(contents) = read_optional(&path).await? else {
        return Ok(None);
    };
    let account = serde_json::from_str(&contents)
        .with_context(|| format!("invalid account file {}", path.display()))?;
    Ok(Some(account))
}

/// Saves the signed-in account.
pub async fn save_account(paths: &Paths, account: &AuthenticatedAccount) -> Result<()> {
    tokio::fs::create_dir_all(&paths.dir)
        .await
        .with_context(|| format!("cannot create {}", paths.dir.display()))?;

    let path = paths.account_file();
    let contents = serde_json::to_string_pretty(account)?;
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("cannot write {}", path.display()))?;

    tracing::debug!("Account saved to {:?}", path);
    Ok(())
}

/// Removes the saved account, if any.
pub async fn clear_account(paths: &Paths) -> Result<()> {
    let path = paths.account_file();
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("cannot remove {}", path.display())),
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use xbldev_auth::AccountType;

    use super::*;

    fn paths_in(dir: &tempfile::TempDir) -> Paths {
        Paths::resolve(Some(dir.path().join("xbldev")))
    }

    #[tokio::test]
    async fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&paths_in(&dir)).await.unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.account_source, AccountSource::DevCenter);
        assert_eq!(config.poll_interval(), Duration::from_millis(3000));
        assert_eq!(config.job_service_url.as_str(), DEFAULT_JOB_SERVICE_URL);
    }

    #[tokio::test]
    async fn test_partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        std::fs::create_dir_all(&paths.dir).unwrap();
        std::fs::write(
            paths.config_file(),
            r#"{"account_source": "static-token", "poll_interval_ms": 50}"#,
        )
        .unwrap();

        let config = Config::load(&paths).await.unwrap();
        assert_eq!(config.account_source, AccountSource::StaticToken);
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.tenant, "organizations");
        assert_eq!(config.batch_concurrency, 4);
    }

    #[tokio::test]
    async fn test_invalid_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        std::fs::create_dir_all(&paths.dir).unwrap();
        std::fs::write(paths.config_file(), "{not json").unwrap();

        let error = Config::load(&paths).await.unwrap_err();
        assert!(error.to_string().contains("config.json"));
    }

    #[tokio::test]
    async fn test_account_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        assert!(load_account(&paths).await.unwrap().is_none());

        let account = AuthenticatedAccount {
            display_name: "Dev".into(),
            account_id: "A1".into(),
            account_type: AccountType::Publisher,
            account_source: AccountSource::DevCenter,
            account_moniker: "dev@contoso.com".into(),
        };
        save_account(&paths, &account).await.unwrap();
        assert_eq!(load_account(&paths).await.unwrap(), Some(account));

        clear_account(&paths).await.unwrap();
        assert!(load_account(&paths).await.unwrap().is_none());
        // Clearing twice is fine.
        clear_account(&paths).await.unwrap();
    }
}

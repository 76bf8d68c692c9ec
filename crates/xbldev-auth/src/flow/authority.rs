//! Directory endpoint configuration.

use url::Url;

use crate::error::{Error, Result};

/// Scopes requested when none are configured.
const DEFAULT_SCOPES: &[&str] = &["openid", "profile", "offline_access"];

/// Directory (`OAuth2` authority) configuration.
#[derive(Debug, Clone)]
pub struct Authority {
    /// Authority name (e.g., "Microsoft").
    pub name: String,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Device authorization endpoint.
    pub device_auth_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Authority {
    /// Creates a new authority configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        token_url: impl AsRef<str>,
        device_auth_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            token_url: Url::parse(token_url.as_ref())?,
            device_auth_url: Url::parse(device_auth_url.as_ref())?,
            default_scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Microsoft identity platform for a tenant (`organizations`, `common`,
    /// or a tenant id).
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant is empty or the URLs are invalid.
    pub fn microsoft(tenant: &str) -> Result<Self> {
        if tenant.trim().is_empty() {
            return Err(Error::InvalidConfig("tenant is empty".into()));
        }

        Self::new(
            "Microsoft",
            format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token"),
            format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/devicecode"),
        )
    }
}

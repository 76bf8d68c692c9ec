//! Source of authorization header values for service calls.

use async_trait::async_trait;
use xbldev_auth::AuthSession;

use crate::error::Result;

/// Produces `Authorization` values, refreshing credentials as needed.
///
/// Called before every request so a long poll never presents an expired
/// token.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns the header value for a title in a sandbox.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Auth`] when no credential can be produced.
    async fn authorization_header(&self, scid: &str, sandbox: &str) -> Result<String>;
}

#[async_trait]
impl Authorizer for AuthSession {
    async fn authorization_header(&self, scid: &str, sandbox: &str) -> Result<String> {
        Ok(Self::authorization_header(self, scid, sandbox).await?)
    }
}

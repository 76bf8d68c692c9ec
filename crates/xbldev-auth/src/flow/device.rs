//! Device Authorization Flow (RFC 8628), used for interactive sign-in from a
//! terminal.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DirectoryToken, OAuthClient, TokenResponse, read_error_response};
use crate::error::{Error, Result};

/// Device authorization response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceAuthorization {
    /// Device code for polling.
    pub device_code: String,
    /// User code to display to the user.
    pub user_code: String,
    /// Verification URI where user should go.
    pub verification_uri: String,
    /// Message the directory suggests showing, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Expiration time in seconds.
    pub expires_in: u32,
    /// Polling interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u32,
}

const fn default_interval() -> u32 {
    5
}

impl DeviceAuthorization {
    /// Number of polls that fit in the device code lifetime.
    #[must_use]
    pub fn max_polls(&self) -> u32 {
        (self.expires_in / self.interval.max(1)).max(1)
    }
}

/// Device Authorization Flow.
#[derive(Debug, Clone)]
pub struct DeviceFlow {
    client: OAuthClient,
}

impl DeviceFlow {
    /// Creates a new device flow.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self { client }
    }

    /// Directory client used by this flow.
    #[must_use]
    pub const fn client(&self) -> &OAuthClient {
        &self.client
    }

    /// Requests a device code and user code.
    ///
    /// `login_hint` pre-fills the account picker when supported.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization request fails.
    pub async fn request_device_authorization(
        &self,
        login_hint: Option<&str>,
    ) -> Result<DeviceAuthorization> {
        let authority = &self.client.authority;
        let scope = authority.default_scopes.join(" ");

        let mut params = vec![
            ("client_id", self.client.client_id.as_str()),
            ("scope", scope.as_str()),
        ];
        if let Some(hint) = login_hint {
            params.push(("login_hint", hint));
        }

        let response = self
            .client
            .http_client()
            .post(authority.device_auth_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(read_error_response(response).await?.into_error());
        }

        response.json().await.map_err(Into::into)
    }

    /// Polls the token endpoint once after waiting `interval`.
    ///
    /// `authorization_pending` and `slow_down` come back as
    /// [`Error::OAuth`] and mean "keep polling".
    ///
    /// # Errors
    ///
    /// Returns an error if polling fails; [`Error::AccessDenied`] if the user
    /// declined.
    pub async fn poll_for_token(
        &self,
        device_code: &str,
        interval: Duration,
    ) -> Result<DirectoryToken> {
        tokio::time::sleep(interval).await;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
            ("device_code", device_code),
            ("client_id", self.client.client_id.as_str()),
        ];

        let response = self
            .client
            .http_client()
            .post(self.client.authority.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = read_error_response(response).await?;

            return match error.error.as_str() {
                "authorization_pending" | "slow_down" => {
                    Err(Error::oauth_error(error.error, error.error_description))
                }
                "access_denied" | "authorization_declined" => Err(Error::AccessDenied),
                "expired_token" => Err(Error::TokenExpired),
                _ => Err(error.into_error()),
            };
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(DirectoryToken::from_response(token_response))
    }

    /// Waits for the user to finish the device authorization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the device code lifetime runs out.
    pub async fn wait_for_token(&self, auth: &DeviceAuthorization) -> Result<DirectoryToken> {
        let mut interval = Duration::from_secs(u64::from(auth.interval));
        let max_attempts = auth.max_polls();
        let mut attempts = 0;

        loop {
            if attempts >= max_attempts {
                return Err(Error::Timeout(auth.expires_in.into()));
            }

            match self.poll_for_token(&auth.device_code, interval).await {
                Ok(token) => return Ok(token),
                Err(Error::OAuth { ref error, .. }) if error == "authorization_pending" => {
                    attempts += 1;
                }
                Err(Error::OAuth { ref error, .. }) if error == "slow_down" => {
                    // RFC 8628 §3.5
                    interval += Duration::from_secs(5);
                    attempts += 1;
                    debug!("Directory asked to slow down; polling every {interval:?}");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        assert_eq!(default_interval(), 5);
    }

    #[test]
    fn test_device_auth_deserialization() {
        let json = r#"{
            "device_code": "dev123",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://microsoft.com/devicelogin",
            "message": "To sign in, use a web browser",
            "expires_in": 900
        }"#;

        let auth: DeviceAuthorization = serde_json::from_str(json).unwrap();
        assert_eq!(auth.user_code, "ABCD-EFGH");
        assert_eq!(auth.interval, 5);
        assert_eq!(auth.max_polls(), 180);
    }

    #[test]
    fn test_max_polls_never_zero() {
        let auth = DeviceAuthorization {
            device_code: "d".into(),
            user_code: "u".into(),
            verification_uri: "https://example.com".into(),
            message: None,
            expires_in: 1,
            interval: 0,
        };
        assert_eq!(auth.max_polls(), 1);
    }
}

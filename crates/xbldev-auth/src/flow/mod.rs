//! Directory sign-in flows.

mod authority;
mod device;
mod token;

pub use authority::Authority;
pub use device::{DeviceAuthorization, DeviceFlow};
pub use token::{DirectoryToken, ErrorResponse, TokenResponse};

use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::error::{Error, Result};

/// Reads the OAuth error body of a failed directory answer.
///
/// Throttling and server failures usually carry no OAuth body; they come
/// back as [`Error::Service`] so the status survives.
pub(crate) async fn read_error_response(response: Response) -> Result<ErrorResponse> {
    let status = response.status();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::service(status, &body));
    }
    Ok(response.json().await?)
}

/// Directory client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID registered with the directory.
    pub client_id: String,
    /// Authority configuration.
    pub authority: Authority,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new directory client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, authority: Authority) -> Self {
        Self {
            client_id: client_id.into(),
            authority,
            http_client: Client::new(),
        }
    }

    /// Uses a preconfigured HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Refreshes a directory token using its refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or if the token has no refresh token.
    pub async fn refresh_token(&self, token: &DirectoryToken) -> Result<DirectoryToken> {
        let refresh_token = token.refresh_token()?;
        let scope = self.authority.default_scopes.join(" ");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("scope", scope.as_str()),
        ];

        debug!("Refreshing directory token at {}", self.authority.token_url);
        let response = self
            .http_client
            .post(self.authority.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(read_error_response(response).await?.into_error());
        }

        let token_response: TokenResponse = response.json().await?;
        let mut new_token = DirectoryToken::from_response(token_response);

        // Preserve refresh token if not returned
        if new_token.refresh_token.is_none() {
            new_token.refresh_token.clone_from(&token.refresh_token);
        }

        Ok(new_token)
    }

    pub(crate) const fn http_client(&self) -> &Client {
        &self.http_client
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails_early() {
        let client = OAuthClient::new("client", Authority::microsoft("common").unwrap());
        let token = DirectoryToken {
            access_token: "aad".into(),
            token_type: "Bearer".into(),
            expires_at: None,
            refresh_token: None,
            id_token: None,
        };

        let result = client.refresh_token(&token).await;
        assert!(matches!(result, Err(crate::Error::NoRefreshToken)));
    }
}

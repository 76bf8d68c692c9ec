//! Exchange of a directory token for an Xbox Live developer token.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::header::CONTRACT_VERSION_HEADER;
use crate::token::{Credential, IdentityClaims, TokenKey};

/// Default developer token service endpoint.
pub const DEFAULT_TOKEN_SERVICE_URL: &str = "https://xdts.xboxlive.com/xdts/authorize";

/// Contract version of the token service.
pub const TOKEN_SERVICE_CONTRACT_VERSION: &str = "1";

const RELYING_PARTY: &str = "http://developer.xboxlive.com";

// Display claim names in the token service response.
const CLAIM_DISPLAY_NAME: &str = "dn";
const CLAIM_ACCOUNT_ID: &str = "aid";
const CLAIM_ACCOUNT_TYPE: &str = "atp";
const CLAIM_MONIKER: &str = "eml";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExchangeRequest<'a> {
    properties: ExchangeProperties<'a>,
    relying_party: &'a str,
    token_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExchangeProperties<'a> {
    auth_method: &'a str,
    aad_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scid: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sandboxes: Vec<&'a str>,
}

/// Token service response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExchangeResponse {
    /// Issue time.
    pub issue_instant: DateTime<Utc>,
    /// Expiry time.
    pub not_after: DateTime<Utc>,
    /// Xbox token.
    pub token: String,
    /// Display claims.
    #[serde(default)]
    pub display_claims: DisplayClaims,
}

/// Display claims block of a token service response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayClaims {
    /// Per-user claim sets; the first one describes the caller.
    #[serde(default)]
    pub xui: Vec<HashMap<String, String>>,
}

impl ExchangeResponse {
    /// Converts the response into a credential for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lifetime is inverted.
    pub fn into_credential(self, key: TokenKey) -> Result<Credential> {
        let claims = self
            .display_claims
            .xui
            .first()
            .map(|xui| IdentityClaims {
                display_name: xui.get(CLAIM_DISPLAY_NAME).cloned(),
                account_id: xui.get(CLAIM_ACCOUNT_ID).cloned(),
                account_type: xui.get(CLAIM_ACCOUNT_TYPE).cloned(),
                moniker: xui.get(CLAIM_MONIKER).cloned(),
            })
            .unwrap_or_default();

        Ok(Credential::new(key, self.token, self.issue_instant, self.not_after)?
            .with_claims(claims))
    }
}

/// Client for the developer token service.
#[derive(Debug, Clone)]
pub struct TokenService {
    endpoint: Url,
    http_client: Client,
}

impl TokenService {
    /// Creates a client for `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            http_client: Client::new(),
        }
    }

    /// Uses a preconfigured HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Exchanges a directory access token for a token scoped to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] when the service refuses the
    /// directory token, [`Error::Service`] with the status for any other
    /// non-success answer, or a transport/parse error.
    pub async fn exchange(&self, directory_token: &str, key: &TokenKey) -> Result<Credential> {
        let request = ExchangeRequest {
            properties: ExchangeProperties {
                auth_method: "AAD",
                aad_token: directory_token,
                scid: (!key.scid.is_empty()).then_some(key.scid.as_str()),
                sandboxes: if key.sandbox.is_empty() {
                    Vec::new()
                } else {
                    vec![key.sandbox.as_str()]
                },
            },
            relying_party: RELYING_PARTY,
            token_type: "JWT",
        };

        debug!("Requesting developer token for {key}");
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(CONTRACT_VERSION_HEADER, TOKEN_SERVICE_CONTRACT_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AuthenticationFailed(format!(
                "token service returned {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::service(status, &body));
        }

        let exchanged: ExchangeResponse = response.json().await?;
        exchanged.into_credential(key.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ExchangeRequest {
            properties: ExchangeProperties {
                auth_method: "AAD",
                aad_token: "aad",
                scid: Some("00000000-0000-0000-0000-000000000001"),
                sandboxes: vec!["XDKS.1"],
            },
            relying_party: RELYING_PARTY,
            token_type: "JWT",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["RelyingParty"], RELYING_PARTY);
        assert_eq!(json["Properties"]["AadToken"], "aad");
        assert_eq!(json["Properties"]["Sandboxes"][0], "XDKS.1");
    }

    #[test]
    fn test_default_key_omits_title_properties() {
        let request = ExchangeRequest {
            properties: ExchangeProperties {
                auth_method: "AAD",
                aad_token: "aad",
                scid: None,
                sandboxes: Vec::new(),
            },
            relying_party: RELYING_PARTY,
            token_type: "JWT",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json["Properties"].get("Scid").is_none());
        assert!(json["Properties"].get("Sandboxes").is_none());
    }

    #[test]
    fn test_response_into_credential() {
        let json = r#"{
            "IssueInstant": "2030-01-01T00:00:00Z",
            "NotAfter": "2030-01-01T04:00:00Z",
            "Token": "xbl-token",
            "DisplayClaims": { "xui": [ { "dn": "Dev One", "aid": "1234", "atp": "Publisher", "eml": "dev@contoso.com" } ] }
        }"#;

        let response: ExchangeResponse = serde_json::from_str(json).unwrap();
        let credential = response
            .into_credential(TokenKey::new("scid", "XDKS.1"))
            .unwrap();

        assert_eq!(credential.token(), "xbl-token");
        assert_eq!(credential.subject(), &TokenKey::new("scid", "XDKS.1"));
        assert_eq!(credential.claims().display_name.as_deref(), Some("Dev One"));
        assert_eq!(credential.claims().account_type.as_deref(), Some("Publisher"));
    }

    #[test]
    fn test_response_without_claims() {
        let json = r#"{
            "IssueInstant": "2030-01-01T00:00:00Z",
            "NotAfter": "2030-01-01T04:00:00Z",
            "Token": "xbl-token"
        }"#;

        let response: ExchangeResponse = serde_json::from_str(json).unwrap();
        let credential = response.into_credential(TokenKey::default()).unwrap();
        assert_eq!(credential.claims(), &IdentityClaims::default());
    }
}

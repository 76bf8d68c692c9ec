//! Identity provider selection.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;
use xbldev_auth::flow::DeviceAuthorization;
use xbldev_auth::{
    AccountSource, Authority, DeviceCodeIdentity, DeviceFlow, IdentityProvider, Keychain,
    OAuthClient, StaticTokenIdentity, TokenService,
};

use crate::config::Config;

/// Builds the provider for an account source.
pub fn provider_for(source: AccountSource, config: &Config) -> Result<Arc<dyn IdentityProvider>> {
    match source {
        AccountSource::DevCenter => {
            let Some(client_id) = config.client_id.as_deref().filter(|id| !id.trim().is_empty())
            else {
                bail!("client_id is not configured; add it to config.json or use --source static-token");
            };

            let authority = Authority::microsoft(&config.tenant)?;
            let flow = DeviceFlow::new(OAuthClient::new(client_id, authority));
            let service = TokenService::new(config.token_service_url.clone());
            let provider = DeviceCodeIdentity::new(flow, service)
                .with_keychain(Keychain::new(source.as_str()))
                .with_prompt(show_device_code);
            Ok(Arc::new(provider))
        }
        AccountSource::StaticToken => {
            let provider = StaticTokenIdentity::from_env()
                .context("static-token sign-in needs a token in XBLDEV_TOKEN")?;
            Ok(Arc::new(provider))
        }
    }
}

fn show_device_code(auth: &DeviceAuthorization) {
    let message = auth.message.clone().unwrap_or_else(|| {
        format!(
            "To sign in, open {} and enter the code {}",
            auth.verification_uri, auth.user_code
        )
    });
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{message}");

    if let Err(e) = opener::open(&auth.verification_uri) {
        debug!("Could not open a browser: {e}");
    }
}

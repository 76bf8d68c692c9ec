//! Example: developer sign-in with the device code flow
//!
//! This example demonstrates how to:
//! 1. Configure the directory authority and device flow
//! 2. Sign in interactively and exchange for an Xbox developer token
//! 3. Produce an `Authorization` header for a title and sandbox
//!
//! ## Prerequisites
//!
//! Set environment variables:
//! ```bash
//! export XBLDEV_CLIENT_ID="your-client-id-here"
//! export XBLDEV_SCID="00000000-0000-0000-0000-000000000000"
//! ```
//!
//! ## Running
//!
//! ```bash
//! cargo run --example device_sign_in
//! ```

use std::env;
use std::sync::Arc;

use xbldev_auth::exchange::DEFAULT_TOKEN_SERVICE_URL;
use xbldev_auth::{AuthSession, Authority, DeviceCodeIdentity, DeviceFlow, OAuthClient, TokenService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client_id = env::var("XBLDEV_CLIENT_ID")?;
    let scid = env::var("XBLDEV_SCID")?;

    println!("Step 1: Configuring device sign-in...");
    let authority = Authority::microsoft("organizations")?;
    println!("  Authority: {}", authority.name);
    let flow = DeviceFlow::new(OAuthClient::new(client_id, authority));
    let service = TokenService::new(DEFAULT_TOKEN_SERVICE_URL.parse()?);

    let identity = DeviceCodeIdentity::new(flow, service).with_prompt(|auth| {
        println!("\nVisit {} and enter code {}\n", auth.verification_uri, auth.user_code);
    });

    println!("Step 2: Signing in...");
    let session = AuthSession::new(Arc::new(identity));
    let account = session.sign_in(None).await?;
    println!("  Signed in as {} ({})", account.display_name, account.account_type);

    println!("Step 3: Requesting a title token...");
    let header = session.authorization_header(&scid, "XDKS.1").await?;
    println!("  Authorization: {}...", &header[..header.len().min(24)]);

    Ok(())
}

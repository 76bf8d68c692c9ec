//! # xbldev-auth
//!
//! Developer account sign-in and Xbox Live credential caching.
//!
//! ## Features
//!
//! - **Token cache**: one credential per (service id, sandbox), refreshed
//!   only when it is about to expire; concurrent refreshes of the same key
//!   coalesce into one back-end call
//! - **Session**: sign-in, sign-out, current account, authorization headers
//! - **Identity providers**: device-code directory sign-in exchanged for
//!   Xbox developer tokens, or a pre-issued token
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use xbldev_auth::{AuthSession, StaticTokenIdentity};
//!
//! #[tokio::main]
//! async fn main() -> xbldev_auth::Result<()> {
//!     let provider = Arc::new(StaticTokenIdentity::from_env()?);
//!     let session = AuthSession::new(provider);
//!
//!     let account = session.sign_in(None).await?;
//!     println!("Signed in as {}", account.display_name);
//!
//!     let header = session.authorization_header("scid", "XDKS.1").await?;
//!     // Send: Authorization: {header}
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod exchange;
pub mod flow;
pub mod header;
pub mod keychain;
pub mod provider;
pub mod session;
pub mod store;
pub mod token;

pub use error::{Error, Result};
pub use exchange::TokenService;
pub use flow::{Authority, DeviceFlow, OAuthClient};
pub use keychain::Keychain;
pub use provider::{
    AccountSource, DeviceCodeIdentity, DevicePrompt, IdentityProvider, StaticTokenIdentity,
};
pub use session::{AccountType, AuthSession, AuthenticatedAccount};
pub use store::TokenStore;
pub use token::{Credential, IdentityClaims, TokenKey};

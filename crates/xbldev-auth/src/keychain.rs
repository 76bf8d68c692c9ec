//! Persistence of the directory sign-in in the system keyring.
//!
//! Uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::flow::DirectoryToken;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "xbldev";

/// Keyring slot holding directory tokens for one account source.
#[derive(Debug, Clone)]
pub struct Keychain {
    entry_name: String,
}

impl Keychain {
    /// Creates a slot named after the account source.
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            entry_name: format!("{SERVICE_NAME}_directory_token_{source}"),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Ok(Entry::new(SERVICE_NAME, &self.entry_name)?)
    }

    /// Stores a directory token, serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation fails.
    pub fn store(&self, token: &DirectoryToken) -> Result<()> {
        let token_json = serde_json::to_string(token)?;
        self.entry()?.set_password(&token_json)?;
        debug!("Stored directory token in {}", self.entry_name);
        Ok(())
    }

    /// Loads the stored directory token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation or deserialization fails.
    pub fn load(&self) -> Result<Option<DirectoryToken>> {
        match self.entry()?.get_password() {
            Ok(token_json) => Ok(Some(serde_json::from_str(&token_json)?)),
            Err(keyring::Error::NoEntry) => {
                debug!("No directory token in {}", self.entry_name);
                Ok(None)
            }
            Err(e) => Err(Error::Keyring(e)),
        }
    }

    /// Deletes the stored directory token. Missing entries are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation fails.
    pub fn delete(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                debug!("Deleted directory token from {}", self.entry_name);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                warn!("Failed to delete directory token: {e}");
                Err(Error::Keyring(e))
            }
        }
    }
}

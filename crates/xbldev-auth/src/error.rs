//! Error types for sign-in and token operations.

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `OAuth2` error from the directory.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// Error code (e.g., `invalid_grant`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// The identity back-end rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No identity is cached for silent acquisition.
    #[error("No cached identity; sign in first")]
    NoCachedIdentity,

    /// An operation needs a signed-in account.
    #[error("Not signed in")]
    NotSignedIn,

    /// Sign-out was requested with no account signed in.
    #[error("No account is signed in")]
    NoAccount,

    /// Token expired.
    #[error("Token expired")]
    TokenExpired,

    /// No refresh token available.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Credential violates `not_after > issued_at` or is otherwise malformed.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// A sign-in or token service answered with an unexpected status.
    #[error("Service returned {status}: {message}")]
    Service {
        /// HTTP status.
        status: reqwest::StatusCode,
        /// Response body or reason.
        message: String,
    },

    /// Invalid token response.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Authorization timeout.
    #[error("Authorization timed out after {0} seconds")]
    Timeout(u64),

    /// User denied authorization.
    #[error("User denied authorization")]
    AccessDenied,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Keyring access failed.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl Error {
    /// Creates an OAuth error from error code and description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Creates a service error from a status and response body.
    #[must_use]
    pub fn service(status: reqwest::StatusCode, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("no reason").to_string()
        } else {
            body.trim().to_string()
        };
        Self::Service { status, message }
    }

    /// HTTP status of a service failure, if the back-end answered with one.
    #[must_use]
    pub const fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the identity back-end could not be reached at all.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }
}

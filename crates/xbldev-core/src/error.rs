//! Error taxonomy for title service calls.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Classification of a failure, preserved from the core to the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credentials were rejected (401) or no usable sign-in exists.
    AuthenticationFailure,
    /// The caller has no access to the title or sandbox (403).
    Forbidden,
    /// The addressed resource does not exist (404).
    NotFound,
    /// Any other 4xx.
    BadRequest,
    /// Throttled (429).
    TooManyRequests,
    /// 5xx, or a response the client could not understand.
    ServerError,
    /// No response was received.
    NetworkError,
}

impl ErrorKind {
    /// Maps a non-success HTTP status to a kind.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::AuthenticationFailure,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::TooManyRequests,
            s if s.is_client_error() => Self::BadRequest,
            _ => Self::ServerError,
        }
    }

    /// Returns true if retrying later may succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::TooManyRequests | Self::ServerError | Self::NetworkError
        )
    }

    /// What the user can do about it.
    #[must_use]
    pub const fn advice(self) -> &'static str {
        match self {
            Self::AuthenticationFailure => "sign in again",
            Self::Forbidden => "contact your account administrator for access to this title",
            Self::NotFound => "check the service configuration id and sandbox",
            Self::BadRequest => "check the command arguments",
            Self::TooManyRequests | Self::ServerError | Self::NetworkError => "retry later",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AuthenticationFailure => "authentication failure",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::BadRequest => "bad request",
            Self::TooManyRequests => "too many requests",
            Self::ServerError => "server error",
            Self::NetworkError => "network error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur talking to title services.
#[derive(Debug, Error)]
pub enum Error {
    /// Sign-in or token acquisition failed.
    #[error(transparent)]
    Auth(#[from] xbldev_auth::Error),

    /// The service answered with a non-success status.
    #[error("{kind} (HTTP {status}): {message}")]
    Service {
        /// Classification.
        kind: ErrorKind,
        /// HTTP status.
        status: StatusCode,
        /// Response body or reason.
        message: String,
    },

    /// The request never got a response.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Endpoint URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Builds a service error from a status and response body.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("no reason").to_string()
        } else {
            body.trim().to_string()
        };

        Self::Service {
            kind: ErrorKind::from_status(status),
            status,
            message,
        }
    }

    /// Classification of this error.
    ///
    /// Sign-in failures keep the status the identity back-end answered with;
    /// without one they count as [`ErrorKind::AuthenticationFailure`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(e) if e.is_network() => ErrorKind::NetworkError,
            Self::Auth(e) => e
                .status()
                .map_or(ErrorKind::AuthenticationFailure, ErrorKind::from_status),
            Self::Service { kind, .. } => *kind,
            Self::Transport(_) => ErrorKind::NetworkError,
            Self::Serde(_) | Self::InvalidResponse(_) => ErrorKind::ServerError,
            Self::InvalidRequest(_) | Self::Url(_) => ErrorKind::BadRequest,
        }
    }

    /// Returns true for failures of the local session rather than of the
    /// service call. These propagate instead of becoming a failed outcome.
    #[must_use]
    pub const fn is_session(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

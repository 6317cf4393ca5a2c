use thiserror::Error;

use crate::config::ConfigError;

/// Why a login attempt failed.
///
/// `NotFound` and `MismatchedSecret` must reach the client as the same
/// response; only logs may tell them apart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("no user with this email")]
    NotFound,

    #[error("password does not match")]
    MismatchedSecret,

    #[error("credential store unavailable: {0}")]
    BackendUnavailable(String),
}

impl AuthFailure {
    /// True for the two cases reported as "invalid credentials".
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::NotFound | Self::MismatchedSecret)
    }

    /// Backend faults may succeed if the caller retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}

/// Why a protected request was rejected
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthzFailure {
    #[error("missing bearer token")]
    MissingToken,

    /// Bad signature, malformed or expired; deliberately not more specific.
    #[error("invalid token")]
    InvalidToken,
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Credentials(#[from] AuthFailure),

    #[error(transparent)]
    Token(#[from] ConfigError),
}

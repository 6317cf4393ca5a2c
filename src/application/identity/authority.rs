//! Token authority: issues bearer tokens after a successful login and
//! checks them on every protected request.
//!
//! Tokens are stateless HS256 JWTs. Authorization never touches storage;
//! the email claim is trusted for the rest of the request.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::errors::AuthzFailure;
use crate::config::ConfigError;
use crate::domain::UserProfile;
use crate::infrastructure::crypto::jwt::{create_token, verify_token, JwtConfig, TokenClaims};

/// A freshly signed token as returned to the client
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug)]
pub struct TokenAuthority {
    config: JwtConfig,
}

impl TokenAuthority {
    /// Fails when the signing secret is empty; callers treat this as a
    /// startup error.
    pub fn new(config: JwtConfig) -> Result<Self, ConfigError> {
        if config.secret.trim().is_empty() {
            return Err(ConfigError::MissingSigningSecret);
        }
        Ok(Self { config })
    }

    pub fn expires_in(&self) -> i64 {
        self.config.expiration_secs
    }

    /// Issue a token for an identity that has already been verified.
    pub fn issue(&self, identity: &UserProfile) -> Result<IssuedToken, ConfigError> {
        self.issue_at(&identity.email, Utc::now())
    }

    pub fn issue_at(
        &self,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, ConfigError> {
        let token = create_token(email, issued_at, &self.config)
            .map_err(|e| ConfigError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.expiration_secs,
        })
    }

    /// Check the raw `Authorization` header value.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<TokenClaims, AuthzFailure> {
        let token = authorization
            .and_then(extract_bearer)
            .ok_or(AuthzFailure::MissingToken)?;

        verify_token(token, &self.config).map_err(|e| {
            debug!(reason = ?e.kind(), "Token rejected");
            AuthzFailure::InvalidToken
        })
    }
}

/// Token part of `Bearer <token>`; the scheme is case-insensitive.
pub fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

//! JWT Token handling

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Lifetime of an issued token
pub const TOKEN_TTL_SECS: i64 = 3600;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens (HS256)
    pub secret: String,
    /// Token expiration time in seconds
    pub expiration_secs: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_secs: TOKEN_TTL_SECS,
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Identity asserted by the token
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(email: &str, issued_at: DateTime<Utc>, config: &JwtConfig) -> Self {
        let exp = issued_at + Duration::seconds(config.expiration_secs);
        Self {
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        }
    }
}

/// Sign claims for `email`, issued at `issued_at`
pub fn create_token(
    email: &str,
    issued_at: DateTime<Utc>,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(email, issued_at, config);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature and expiry, then decode the claims.
///
/// Expiry is checked with zero leeway.
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret")
    }

    #[test]
    fn test_create_and_verify_token() {
        let now = Utc::now();
        let token = create_token("a@x.com", now, &config()).unwrap();

        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_token("invalid-token", &config());
        assert!(result.is_err());
    }

    #[test]
    fn expired_token_is_rejected_without_leeway() {
        let issued = Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 5);
        let token = create_token("a@x.com", issued, &config()).unwrap();

        let err = verify_token(&token, &config()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("a@x.com", Utc::now(), &config()).unwrap();
        let err = verify_token(&token, &JwtConfig::new("other-secret")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }
}

//! Authentication middleware for Axum
//!
//! Guards every protected route: reads the `Authorization` header, asks the
//! token authority for a verdict and either forwards the request with an
//! [`AuthenticatedUser`] extension or answers 401/403 itself.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::{AuthzFailure, TokenAuthority};
use crate::infrastructure::crypto::jwt::TokenClaims;
use crate::interfaces::http::common::ApiError;

pub const MISSING_TOKEN_MESSAGE: &str = "Access denied. Token required.";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token.";

/// Authentication state
#[derive(Clone)]
pub struct AuthState {
    pub authority: Arc<TokenAuthority>,
}

/// Caller identity established by a valid bearer token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<TokenClaims> for AuthenticatedUser {
    fn from(claims: TokenClaims) -> Self {
        Self {
            email: claims.email,
            iat: claims.iat,
            exp: claims.exp,
        }
    }
}

impl From<AuthzFailure> for ApiError {
    fn from(failure: AuthzFailure) -> Self {
        match failure {
            AuthzFailure::MissingToken => ApiError::Unauthorized(MISSING_TOKEN_MESSAGE.into()),
            AuthzFailure::InvalidToken => ApiError::Forbidden(INVALID_TOKEN_MESSAGE.into()),
        }
    }
}

/// Bearer token authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // A header that is not valid UTF-8 cannot carry a token.
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_state.authority.authorize(auth_header) {
        Ok(claims) => {
            metrics::counter!("auth_authorize_total", "outcome" => "ok").increment(1);
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from(claims));
            next.run(request).await
        }
        Err(failure) => {
            let outcome = match failure {
                AuthzFailure::MissingToken => "missing_token",
                AuthzFailure::InvalidToken => "invalid_token",
            };
            metrics::counter!("auth_authorize_total", "outcome" => outcome).increment(1);
            ApiError::from(failure).into_response()
        }
    }
}

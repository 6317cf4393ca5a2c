//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{error, info};

use super::dto::{LoginRequest, LoginResponse, ProtectedResponse, RegisterRequest, TokenUserInfo};
use crate::application::{AuthFailure, LoginError, NewUser, UserService};
use crate::interfaces::http::common::{ApiError, ErrorResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::users::UserDto;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub user_service: Arc<UserService>,
}

fn login_error(e: LoginError) -> ApiError {
    match e {
        LoginError::Credentials(failure) if failure.is_invalid_credentials() => {
            let outcome = match failure {
                AuthFailure::NotFound => "unknown_email",
                _ => "wrong_password",
            };
            metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);
            ApiError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.into())
        }
        other => {
            let retryable = matches!(&other, LoginError::Credentials(f) if f.is_retryable());
            metrics::counter!("auth_login_total", "outcome" => "error").increment(1);
            error!(error = %other, retryable, "Login could not be completed");
            ApiError::Internal(LOGIN_FAILED_MESSAGE.into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Login failed", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let result = state
        .user_service
        .login(&request.email, &request.password)
        .await
        .map_err(login_error)?;

    metrics::counter!("auth_login_total", "outcome" => "ok").increment(1);

    Ok(Json(LoginResponse {
        token: result.token.token,
        token_type: result.token.token_type,
        expires_in: result.token.expires_in,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let user = state
        .user_service
        .create_user(NewUser {
            name: request.name,
            email: request.email,
            telephone: request.telephone,
            password: request.password,
        })
        .await?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

#[utoipa::path(
    get,
    path = "/auth/protected",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token accepted", body = ProtectedResponse),
        (status = 401, description = "Token missing", body = ErrorResponse),
        (status = 403, description = "Token invalid or expired", body = ErrorResponse)
    )
)]
pub async fn protected(Extension(user): Extension<AuthenticatedUser>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "Welcome to the protected route!".to_string(),
        user: TokenUserInfo {
            email: user.email,
            iat: user.iat,
            exp: user.exp,
        },
    })
}

//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{FilterMode, GetUserDto, UserProfile};
use crate::shared::validations::validate_password;

/// User API representation; never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub telephone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for UserDto {
    fn from(u: UserProfile) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            telephone: u.telephone,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 32, message = "telephone must be at most 32 characters"))]
    pub telephone: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Update user request; absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 32, message = "telephone must be at most 32 characters"))]
    pub telephone: Option<String>,
    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,
}

/// How multiple filters combine
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FilterModeParam {
    #[default]
    Any,
    All,
}

impl From<FilterModeParam> for FilterMode {
    fn from(mode: FilterModeParam) -> Self {
        match mode {
            FilterModeParam::Any => FilterMode::Any,
            FilterModeParam::All => FilterMode::All,
        }
    }
}

/// List users query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersParams {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Case-insensitive substring of the email
    pub email: Option<String>,
    /// Case-insensitive substring of the telephone
    pub telephone: Option<String>,
    /// `any` (default) or `all`
    #[serde(default)]
    #[param(inline)]
    pub mode: FilterModeParam,
}

impl From<ListUsersParams> for GetUserDto {
    fn from(p: ListUsersParams) -> Self {
        Self {
            name: p.name,
            email: p.email,
            telephone: p.telephone,
            mode: p.mode.into(),
        }
    }
}

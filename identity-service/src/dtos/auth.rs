use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::PublicProfile;
use crate::services::TokenPair;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "6531501001")]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "correct-horse-battery")]
    pub password: String,
}

/// Query flag selecting how login delivers tokens: in the JSON body
/// (default) or as http-only cookies.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LoginQuery {
    #[serde(default)]
    #[param(example = false)]
    pub use_cookie: bool,
}

/// Body-mode login response: the client keeps the tokens itself.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub tokens: TokenPair,
    pub user: PublicProfile,
}

/// Cookie-mode login response: tokens travel only in `Set-Cookie`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CookieLoginResponse {
    #[schema(example = "Login successful!")]
    pub message: String,
    pub user: PublicProfile,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "6531501001")]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "Confirm password is required"))]
    pub confirm_password: String,

    /// Recovery secret checked by the password-reset flow.
    #[validate(length(min = 1, message = "Secret is required"))]
    pub secret: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "User registered successfully")]
    pub message: String,
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EligibilityRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "6531501001")]
    pub username: String,

    #[validate(length(min = 1, message = "Secret is required"))]
    pub secret: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EligibilityResponse {
    #[schema(example = "User is eligible for password reset")]
    pub message: String,
    pub user: PublicProfile,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "Confirm password is required"))]
    pub confirm_password: String,

    #[validate(length(min = 1, message = "Secret is required"))]
    pub secret: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logged out successfully")]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    #[schema(example = json!(["auth:session", "auth:admin"]))]
    pub permissions: Vec<String>,
}

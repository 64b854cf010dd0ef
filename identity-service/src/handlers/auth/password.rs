use axum::{Json, extract::State};
use platform_core::error::AppError;

use crate::AppState;
use crate::dtos::ErrorResponse;
use crate::dtos::auth::{
    EligibilityRequest, EligibilityResponse, MessageResponse, ResetPasswordRequest,
};
use crate::utils::ValidatedJson;

/// Check whether a caller may reset a password
///
/// Eligibility means the account exists, has a recovery secret on record,
/// and the presented secret matches it.
#[utoipa::path(
    post,
    path = "/auth/password-reset/eligibility",
    request_body = EligibilityRequest,
    responses(
        (status = 200, description = "Eligible for password reset", body = EligibilityResponse),
        (status = 400, description = "No recovery secret on record", body = ErrorResponse),
        (status = 401, description = "Wrong secret", body = ErrorResponse),
        (status = 404, description = "No such account", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn check_eligibility(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EligibilityRequest>,
) -> Result<Json<EligibilityResponse>, AppError> {
    let identity = state
        .sessions
        .check_reset_eligibility(&req.username, &req.secret)
        .await?;
    let user = state.sessions.profile(&identity).await?;

    Ok(Json(EligibilityResponse {
        message: "User is eligible for password reset".to_string(),
        user,
    }))
}

/// Reset a password using the recovery secret
///
/// Revokes any active session lineage, so every device must log in again
/// with the new password.
#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Confirmation mismatch or password reuse", body = ErrorResponse),
        (status = 401, description = "Wrong secret", body = ErrorResponse),
        (status = 404, description = "No such account", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.sessions.reset_password(req).await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

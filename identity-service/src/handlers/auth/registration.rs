use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use platform_core::error::AppError;

use crate::AppState;
use crate::dtos::ErrorResponse;
use crate::dtos::auth::{RegisterRequest, RegisterResponse};
use crate::utils::ValidatedJson;

/// Complete registration for a provisioned account
///
/// Administration provisions accounts without credentials; the owner picks
/// a password and a recovery secret here. A successful registration also
/// opens a first session.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration complete", body = RegisterResponse),
        (status = 400, description = "Password confirmation mismatch", body = ErrorResponse),
        (status = 404, description = "No such provisioned account", body = ErrorResponse),
        (status = 409, description = "Already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (pair, identity) = state.sessions.register(req).await?;
    tracing::info!(identity_id = %identity.id, "Registration completed");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            tokens: pair,
        }),
    ))
}

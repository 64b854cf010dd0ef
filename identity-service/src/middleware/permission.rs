use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};

use crate::AppState;
use crate::dtos::ErrorResponse;
use crate::services::{Claims, ServiceError};

/// Binds one route subtree to a required permission tag. Routes wire this
/// with the same tag constant they register in the permission catalog.
#[derive(Clone)]
pub struct RequiredPermission {
    pub state: AppState,
    pub tag: &'static str,
}

/// Role-based guard. Must sit inside `auth_middleware`, which is what puts
/// the verified claims into request extensions.
pub async fn permission_middleware(
    State(required): State<RequiredPermission>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let claims = req.extensions().get::<Claims>().cloned().ok_or((
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Authentication required".to_string(),
        }),
    ))?;

    let role = match required.state.sessions.load_role(&claims.sub).await {
        Ok(role) => role,
        // Token subject no longer resolves to an identity; deny rather
        // than error.
        Err(ServiceError::IdentityNotFound) => None,
        Err(e) => {
            tracing::error!(
                identity_id = %claims.sub,
                error = %e,
                "Failed to load role for permission check"
            );
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            ));
        }
    };

    let allowed = role.map(|r| r.allows(required.tag)).unwrap_or(false);
    if !allowed {
        tracing::warn!(
            identity_id = %claims.sub,
            tag = %required.tag,
            "Permission denied"
        );
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Insufficient permissions".to_string(),
            }),
        ));
    }

    Ok(next.run(req).await)
}

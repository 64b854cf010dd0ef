use axum::{Json, extract::State};

use crate::AppState;
use crate::dtos::ErrorResponse;
use crate::dtos::auth::CatalogResponse;

/// List every permission tag the platform declares
///
/// Source of truth for role administration UIs. The list is exactly what
/// handler groups registered at startup, first occurrence first.
#[utoipa::path(
    get,
    path = "/auth/permissions",
    responses(
        (status = 200, description = "Declared permission tags", body = CatalogResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a catalog administrator", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Permissions"
)]
pub async fn permission_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        permissions: state.permissions.catalog().to_vec(),
    })
}

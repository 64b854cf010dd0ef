//! Session and permission-catalog service.
//!
//! Owns credential checks, the two-token session protocol with rotating
//! refresh tokens, and the explicit registry behind the platform's
//! permission catalog.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use platform_core::axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use platform_core::error::AppError;
use platform_core::middleware::security_headers::security_headers_middleware;
use platform_core::middleware::tracing::{REQUEST_ID_HEADER, request_id_middleware};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Environment, IdentityConfig};
use crate::services::{
    HandlerGroup, IdentityStore, PermissionRegistry, SessionService, TokenCodec, tags,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::session::login,
        handlers::auth::session::refresh,
        handlers::auth::session::logout,
        handlers::auth::session::me,
        handlers::auth::registration::register,
        handlers::auth::password::check_eligibility,
        handlers::auth::password::reset_password,
        handlers::catalog::permission_catalog,
    ),
    components(schemas(
        dtos::ErrorResponse,
        dtos::auth::LoginRequest,
        dtos::auth::LoginResponse,
        dtos::auth::CookieLoginResponse,
        dtos::auth::RefreshRequest,
        dtos::auth::RegisterRequest,
        dtos::auth::RegisterResponse,
        dtos::auth::EligibilityRequest,
        dtos::auth::EligibilityResponse,
        dtos::auth::ResetPasswordRequest,
        dtos::auth::MessageResponse,
        dtos::auth::CatalogResponse,
        services::token::TokenPair,
        models::identity::PublicProfile,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Credential checks and session lifecycle"),
        (name = "Permissions", description = "Permission catalog for role administration"),
        (name = "Observability", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: IdentityConfig,
    pub store: Arc<dyn IdentityStore>,
    pub tokens: TokenCodec,
    pub sessions: SessionService,
    pub permissions: Arc<PermissionRegistry>,
}

impl AppState {
    /// Refresh cookie lifetime tracks the refresh token lifetime.
    pub fn refresh_cookie_max_age(&self) -> time::Duration {
        time::Duration::days(self.config.tokens.refresh_token_expiry_days)
    }
}

/// Declare this service's handler groups and the permission tags they
/// require. The catalog endpoint serves exactly this table; the guards on
/// the routes below reference the same constants.
pub fn permission_registry() -> PermissionRegistry {
    let mut registry = PermissionRegistry::new();
    registry.register(
        HandlerGroup::new("auth")
            .handler("POST /auth/login", &[])
            .handler("POST /auth/register", &[])
            .handler("POST /auth/refresh", &[])
            .handler("POST /auth/password-reset/eligibility", &[])
            .handler("POST /auth/password-reset/confirm", &[])
            .handler("POST /auth/logout", &[tags::SESSION_ACCESS])
            .handler("GET /auth/me", &[tags::SESSION_ACCESS])
            .handler("GET /auth/permissions", &[tags::CATALOG_ADMIN]),
    );
    registry
}

pub fn build_router(state: AppState) -> Router {
    // Catalog reads require a session plus the admin tag. Layers run
    // outermost-last, so the auth guard is added after the permission
    // guard to execute before it.
    let catalog_routes = Router::new()
        .route("/auth/permissions", get(handlers::catalog::permission_catalog))
        .layer(from_fn_with_state(
            middleware::RequiredPermission {
                state: state.clone(),
                tag: tags::CATALOG_ADMIN,
            },
            middleware::permission_middleware,
        ))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    let session_routes = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    let base = Router::new().route("/health", get(health_check));

    // Swagger UI only in dev; prod still serves the raw document.
    let base = if state.config.environment == Environment::Dev {
        base.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()))
    } else {
        base.route("/.well-known/openapi.json", get(openapi_json))
    };

    base.route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/auth/password-reset/eligibility",
            post(handlers::auth::check_eligibility),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::auth::reset_password),
        )
        .merge(session_routes)
        .merge(catalog_routes)
        .layer(
            TraceLayer::new_for_http().make_span_with(
                |request: &platform_core::axum::http::Request<platform_core::axum::body::Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                },
            ),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &IdentityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Service health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and its store are reachable"),
        (status = 500, description = "Store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}

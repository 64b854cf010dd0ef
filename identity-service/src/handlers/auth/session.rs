use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use platform_core::error::AppError;

use crate::AppState;
use crate::config::CookieConfig;
use crate::dtos::ErrorResponse;
use crate::dtos::auth::{
    CookieLoginResponse, LoginQuery, LoginRequest, LoginResponse, MessageResponse,
    RefreshRequest,
};
use crate::middleware::{ACCESS_TOKEN_COOKIE, AuthUser, REFRESH_TOKEN_COOKIE};
use crate::models::PublicProfile;
use crate::services::TokenPair;
use crate::utils::ValidatedJson;

// Cookies deliberately outlive the access token: the browser keeps sending
// the stale value and the server answers 401, prompting a refresh.
const ACCESS_COOKIE_MAX_AGE: time::Duration = time::Duration::hours(1);

/// Authenticate with username and password
///
/// With `?useCookie=true` the tokens travel as http-only cookies and the
/// body carries only the profile; otherwise the body carries the tokens.
#[utoipa::path(
    post,
    path = "/auth/login",
    params(LoginQuery),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Response, AppError> {
    let identity = state
        .sessions
        .validate_credentials(&req.username, &req.password)
        .await?;
    let pair = state.sessions.login(&identity).await?;
    let user = state.sessions.profile(&identity).await?;

    if query.use_cookie {
        let jar = with_session_cookies(jar, &pair, &state.config.cookies, state.refresh_cookie_max_age());
        let body = CookieLoginResponse {
            message: "Login successful!".to_string(),
            user,
        };
        return Ok((jar, Json(body)).into_response());
    }

    Ok(Json(LoginResponse { tokens: pair, user }).into_response())
}

/// Exchange a refresh token for a new pair
///
/// The presented token is spent by this call; only the returned pair
/// remains redeemable.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let pair = state.sessions.refresh(&req.refresh_token).await?;
    Ok(Json(pair))
}

/// Terminate the caller's session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session terminated", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.logout(&user.0.sub).await?;

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE, &state.config.cookies))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE, &state.config.cookies));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// Profile of the authenticated caller
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Caller profile", body = PublicProfile),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PublicProfile>, AppError> {
    let identity = state.sessions.find_identity(&user.0.sub).await?;
    let profile = state.sessions.profile(&identity).await?;
    Ok(Json(profile))
}

fn with_session_cookies(
    jar: CookieJar,
    pair: &TokenPair,
    cookies: &CookieConfig,
    refresh_max_age: time::Duration,
) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        ACCESS_COOKIE_MAX_AGE,
        cookies,
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        refresh_max_age,
        cookies,
    ))
}

fn session_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    cookies: &CookieConfig,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .domain(cookies.domain.clone())
        .path("/")
        .http_only(true)
        .secure(cookies.secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Removal must carry the same scoping attributes as the original cookie,
/// or browsers treat it as a different cookie and keep the old one.
fn removal_cookie(name: &'static str, cookies: &CookieConfig) -> Cookie<'static> {
    Cookie::build((name, ""))
        .domain(cookies.domain.clone())
        .path("/")
        .http_only(true)
        .secure(cookies.secure)
        .same_site(SameSite::Lax)
        .build()
}

//! Shared helpers for HTTP-level tests: a router wired to the in-memory
//! store and seeded with known identities and roles.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use identity_service::config::{
    CookieConfig, Environment, IdentityConfig, MongoConfig, SecurityConfig, TokenConfig,
};
use identity_service::models::{Identity, Role};
use identity_service::services::{
    IdentityStore, MemoryStore, SessionService, TokenCodec, tags,
};
use identity_service::utils::{Password, hash_password};
use identity_service::{AppState, build_router, permission_registry};

pub const STUDENT_USERNAME: &str = "6531501001";
pub const STUDENT_PASSWORD: &str = "correct-horse-battery";
pub const STUDENT_SECRET: &str = "sunflower-field";
pub const ADMIN_USERNAME: &str = "platform-admin";
pub const ADMIN_PASSWORD: &str = "admin-passw0rd!";
pub const PROVISIONED_USERNAME: &str = "6531501002";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub student_id: String,
    pub admin_id: String,
    pub provisioned_id: String,
}

pub fn test_config() -> IdentityConfig {
    IdentityConfig {
        common: platform_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "identity-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "unused-in-tests".to_string(),
        },
        tokens: TokenConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        cookies: CookieConfig {
            domain: "localhost".to_string(),
            secure: false,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

fn digest(plain: &str) -> String {
    hash_password(&Password::new(plain.to_string()))
        .expect("hashing test password")
        .into_string()
}

pub async fn spawn_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());

    let student_role = Role::new(
        "Student".to_string(),
        vec![tags::SESSION_ACCESS.to_string()],
    );
    let admin_role = Role::new(
        "Administrator".to_string(),
        vec![tags::SESSION_ACCESS.to_string(), tags::CATALOG_ADMIN.to_string()],
    );
    store.insert_role(&student_role).await.unwrap();
    store.insert_role(&admin_role).await.unwrap();

    let mut student = Identity::new(
        STUDENT_USERNAME.to_string(),
        "Chada Nilubol".to_string(),
        student_role.id.clone(),
    );
    student.password_digest = Some(digest(STUDENT_PASSWORD));
    student.reset_secret_digest = Some(digest(STUDENT_SECRET));

    let mut admin = Identity::new(
        ADMIN_USERNAME.to_string(),
        "Platform Admin".to_string(),
        admin_role.id.clone(),
    );
    admin.password_digest = Some(digest(ADMIN_PASSWORD));

    // Provisioned but not yet registered: no credentials on record.
    let provisioned = Identity::new(
        PROVISIONED_USERNAME.to_string(),
        "New Student".to_string(),
        student_role.id.clone(),
    );

    let student_id = student.id.clone();
    let admin_id = admin.id.clone();
    let provisioned_id = provisioned.id.clone();

    store.insert_identity(&student).await.unwrap();
    store.insert_identity(&admin).await.unwrap();
    store.insert_identity(&provisioned).await.unwrap();

    let store: Arc<dyn IdentityStore> = store;
    let tokens = TokenCodec::new(&config.tokens);
    let sessions = SessionService::new(store.clone(), tokens.clone());
    let permissions = Arc::new(permission_registry());

    let state = AppState {
        config,
        store,
        tokens,
        sessions,
        permissions,
    };
    let router = build_router(state.clone());

    TestApp {
        router,
        state,
        student_id,
        admin_id,
        provisioned_id,
    }
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    bearer: &str,
) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
        .body(Body::from(body.to_string()))
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_empty_auth(app: &Router, uri: &str, bearer: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
        .body(Body::empty())
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get_plain(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get_auth(app: &Router, uri: &str, bearer: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
        .body(Body::empty())
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in through the HTTP surface and return `(access, refresh)`.
pub async fn login_tokens(app: &Router, username: &str, password: &str) -> (String, String) {
    let response = post_json(
        app,
        "/auth/login",
        serde_json::json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    (
        body["tokens"]["accessToken"].as_str().unwrap().to_string(),
        body["tokens"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

/// Pull the `Set-Cookie` header values off a response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn refresh_rotates_the_pair_and_spends_the_old_token() {
    let app = spawn_app().await;
    let (_, refresh) = login_tokens(&app.router, STUDENT_USERNAME, STUDENT_PASSWORD).await;

    let response = post_json(
        &app.router,
        "/auth/refresh",
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let new_refresh = body["refreshToken"].as_str().unwrap().to_string();
    assert!(body["accessToken"].is_string());
    assert_ne!(new_refresh, refresh);

    // Replaying the spent token is refused.
    let replay = post_json(
        &app.router,
        "/auth/refresh",
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(replay).await["error"], "Invalid refresh token");

    // The replacement still works.
    let again = post_json(
        &app.router,
        "/auth/refresh",
        json!({ "refreshToken": new_refresh }),
    )
    .await;
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn a_second_login_supersedes_the_first_refresh_token() {
    let app = spawn_app().await;
    let (_, first_refresh) = login_tokens(&app.router, STUDENT_USERNAME, STUDENT_PASSWORD).await;
    let (_, second_refresh) = login_tokens(&app.router, STUDENT_USERNAME, STUDENT_PASSWORD).await;

    let stale = post_json(
        &app.router,
        "/auth/refresh",
        json!({ "refreshToken": first_refresh }),
    )
    .await;
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

    let live = post_json(
        &app.router,
        "/auth/refresh",
        json!({ "refreshToken": second_refresh }),
    )
    .await;
    assert_eq!(live.status(), StatusCode::OK);
}

#[tokio::test]
async fn tampered_refresh_token_is_unauthorized() {
    let app = spawn_app().await;
    let (_, refresh) = login_tokens(&app.router, STUDENT_USERNAME, STUDENT_PASSWORD).await;

    // Corrupt the signature segment.
    let tampered = format!("{}x", refresh);

    let response = post_json(
        &app.router,
        "/auth/refresh",
        json!({ "refreshToken": tampered }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid refresh token");
}

#[tokio::test]
async fn an_access_token_cannot_be_redeemed_as_a_refresh_token() {
    let app = spawn_app().await;
    let (access, _) = login_tokens(&app.router, STUDENT_USERNAME, STUDENT_PASSWORD).await;

    let response = post_json(
        &app.router,
        "/auth/refresh",
        json!({ "refreshToken": access }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rejects_missing_or_blank_bodies() {
    let app = spawn_app().await;

    let blank = post_json(&app.router, "/auth/refresh", json!({ "refreshToken": "" })).await;
    assert_eq!(blank.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let missing = post_json(&app.router, "/auth/refresh", json!({})).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

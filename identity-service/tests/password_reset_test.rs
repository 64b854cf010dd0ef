mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn eligibility_confirms_the_recovery_secret() {
    let app = spawn_app().await;

    let response = post_json(
        &app.router,
        "/auth/password-reset/eligibility",
        json!({ "username": STUDENT_USERNAME, "secret": STUDENT_SECRET }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "User is eligible for password reset");
    assert_eq!(body["user"]["username"], STUDENT_USERNAME);
}

#[tokio::test]
async fn eligibility_rejects_wrong_secrets_and_unknown_accounts() {
    let app = spawn_app().await;

    let wrong = post_json(
        &app.router,
        "/auth/password-reset/eligibility",
        json!({ "username": STUDENT_USERNAME, "secret": "not-the-secret" }),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await["error"], "Invalid secret");

    let unknown = post_json(
        &app.router,
        "/auth/password-reset/eligibility",
        json!({ "username": "ghost", "secret": STUDENT_SECRET }),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accounts_without_a_secret_are_told_to_register_first() {
    let app = spawn_app().await;

    // The admin fixture was seeded without a recovery secret.
    let response = post_json(
        &app.router,
        "/auth/password-reset/eligibility",
        json!({ "username": ADMIN_USERNAME, "secret": "anything" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "No reset secret set. Please register first."
    );
}

#[tokio::test]
async fn reset_replaces_the_password_and_revokes_sessions() {
    let app = spawn_app().await;
    let (_, refresh) = login_tokens(&app.router, STUDENT_USERNAME, STUDENT_PASSWORD).await;

    let response = post_json(
        &app.router,
        "/auth/password-reset/confirm",
        json!({
            "username": STUDENT_USERNAME,
            "password": "brand-new-password",
            "confirmPassword": "brand-new-password",
            "secret": STUDENT_SECRET,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Password reset successfully");

    // The old session lineage is revoked.
    let replay = post_json(
        &app.router,
        "/auth/refresh",
        json!({ "refreshToken": refresh }),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    // Old password out, new password in.
    let old = post_json(
        &app.router,
        "/auth/login",
        json!({ "username": STUDENT_USERNAME, "password": STUDENT_PASSWORD }),
    )
    .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    login_tokens(&app.router, STUDENT_USERNAME, "brand-new-password").await;
}

#[tokio::test]
async fn reusing_the_previous_password_is_rejected() {
    let app = spawn_app().await;

    let response = post_json(
        &app.router,
        "/auth/password-reset/confirm",
        json!({
            "username": STUDENT_USERNAME,
            "password": STUDENT_PASSWORD,
            "confirmPassword": STUDENT_PASSWORD,
            "secret": STUDENT_SECRET,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "New password cannot be the same as previous password"
    );
}

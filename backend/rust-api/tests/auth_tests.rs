use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{create_test_app, get_json, post_json, register_user};

#[tokio::test]
async fn register_returns_token_and_display_name() {
    let app = create_test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        None,
        json!({
            "email": "newkid@example.com",
            "password": "password123",
            "display_name": "New Kid",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["display_name"], "New Kid");
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let app = create_test_app().await;
    register_user(&app, "taken@example.com").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        None,
        json!({
            "email": "taken@example.com",
            "password": "password123",
            "display_name": "Another Kid",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn login_with_correct_password_succeeds() {
    let app = create_test_app().await;
    register_user(&app, "login@example.com").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        None,
        json!({
            "email": "login@example.com",
            "password": "password123",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["display_name"], "Test Kid");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = create_test_app().await;
    register_user(&app, "kid@example.com").await;

    let (status_wrong, body_wrong) = post_json(
        &app,
        "/api/auth/login",
        None,
        json!({ "email": "kid@example.com", "password": "not-the-password" }),
    )
    .await;

    let (status_unknown, body_unknown) = post_json(
        &app,
        "/api/auth/login",
        None,
        json!({ "email": "nobody@example.com", "password": "password123" }),
    )
    .await;

    assert_eq!(status_wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(status_unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(body_wrong["error"], body_unknown["error"]);
}

#[tokio::test]
async fn invalid_email_shape_is_rejected() {
    let app = create_test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        None,
        json!({
            "email": "not-an-email",
            "password": "password123",
            "display_name": "Kid",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = create_test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        None,
        json!({
            "email": "kid@example.com",
            "password": "short",
            "display_name": "Kid",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = create_test_app().await;

    let (status, body) = get_json(&app, "/api/me/progress", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = create_test_app().await;

    let (status, _) = get_json(&app, "/api/me/progress", Some("not-a-jwt")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_missing_user_is_stale() {
    let app = create_test_app().await;

    // Well-formed token signed with the test secret, but the user was never
    // registered in this store (simulates a token that outlived a data reset).
    let jwt_service = kidcode_api::middlewares::auth::JwtService::new("test-secret");
    let claims =
        kidcode_api::middlewares::auth::JwtClaims::new("ghost-user-id", "ghost@example.com");
    let token = jwt_service.generate_token(claims).unwrap();

    let (status, body) = get_json(&app, "/api/me/progress", Some(&token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Session expired. Please log in again.");
}

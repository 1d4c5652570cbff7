mod common;

use axum::http::Method;
use serde_json::json;

use common::*;

#[tokio::test]
async fn login_returns_token_and_profile() {
    let db = create_test_db().await;
    let app = test_app(&db);
    create_test_user_with_role(&db, "alice@test.local", "admin").await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "alice@test.local", "password": TEST_PASSWORD })),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body["access_token"].as_str().is_some());
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["email"], "alice@test.local");
    assert_eq!(body["user"]["role"], "admin");
    // hashed password never leaves the server
    assert!(body["user"].get("hashed_password").is_none());
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let db = create_test_db().await;
    let app = test_app(&db);
    create_test_user(&db, "bob@test.local").await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "bob@test.local", "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, 401);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn login_with_unknown_email_is_rejected() {
    let db = create_test_db().await;
    let app = test_app(&db);

    let (status, _) = request(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@test.local", "password": TEST_PASSWORD })),
    )
    .await;

    assert_eq!(status, 401);
}

#[tokio::test]
async fn deactivated_user_cannot_login() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, admin_token) = admin_with_token(&db).await;

    let user = create_test_user(&db, "inactive@test.local").await;
    let (status, _) = request(
        &app,
        Method::PUT,
        &format!("/api/users/{}", user.id),
        Some(&admin_token),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = request(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "inactive@test.local", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Account is deactivated");
}

#[tokio::test]
async fn current_user_includes_role_and_permissions() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let user = create_test_user_with_role(&db, "carol@test.local", "manager").await;
    let token = token_for(&user);

    let (status, body) = request(&app, Method::GET, "/api/auth/user", Some(&token), None).await;

    assert_eq!(status, 200);
    assert_eq!(body["email"], "carol@test.local");
    assert_eq!(body["role"], "manager");
    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert!(permissions.contains(&"users.view"));
    assert!(permissions.contains(&"users.manage"));
    assert!(!permissions.contains(&"roles.manage"));
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let db = create_test_db().await;
    let app = test_app(&db);

    let (status, body) = request(&app, Method::GET, "/api/users", None, None).await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Missing bearer token");

    let (status, _) =
        request(&app, Method::GET, "/api/users", Some("not-a-valid-token"), None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn health_is_public() {
    let db = create_test_db().await;
    let app = test_app(&db);

    let (status, body) = request(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn logout_succeeds_without_state() {
    let db = create_test_db().await;
    let app = test_app(&db);

    let (status, _) = request(&app, Method::POST, "/auth/logout", None, None).await;
    assert_eq!(status, 204);
}

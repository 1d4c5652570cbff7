mod common;

use axum::http::Method;
use serde_json::json;

use common::*;

#[tokio::test]
async fn standard_users_cannot_administer_users() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let user = create_test_user_with_role(&db, "plain@test.local", "user").await;
    let token = token_for(&user);

    let (status, body) = request(&app, Method::GET, "/api/users", Some(&token), None).await;
    assert_eq!(status, 403);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("users.view"));

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/users",
        Some(&token),
        Some(json!({
            "email": "sneaky@test.local",
            "first_name": "Sneaky",
            "last_name": "Create",
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn standard_users_can_view_applications_and_analytics() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let user = create_test_user_with_role(&db, "viewer@test.local", "user").await;
    let token = token_for(&user);

    let (status, _) = request(&app, Method::GET, "/api/mini-applications", Some(&token), None).await;
    assert_eq!(status, 200);

    let (status, _) = request(
        &app,
        Method::GET,
        "/api/analytics/statistics",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 200);

    // but they cannot change the catalog
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/mini-applications",
        Some(&token),
        Some(json!({ "name": "Rogue", "category": "misc", "icon": "x" })),
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn users_without_roles_have_no_access() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let user = create_test_user(&db, "roleless@test.local").await;
    let token = token_for(&user);

    for uri in ["/api/users", "/api/departments", "/api/roles", "/api/mini-applications"] {
        let (status, _) = request(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, 403, "expected 403 for {uri}");
    }
}

#[tokio::test]
async fn managers_cannot_touch_roles_or_permissions() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let user = create_test_user_with_role(&db, "mgr@test.local", "manager").await;
    let token = token_for(&user);

    // viewing is part of the manager grant
    let (status, _) = request(&app, Method::GET, "/api/roles", Some(&token), None).await;
    assert_eq!(status, 200);

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/roles",
        Some(&token),
        Some(json!({ "name": "escalated" })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/permissions",
        Some(&token),
        Some(json!({ "name": "x.y", "resource": "x", "action": "y" })),
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn error_bodies_carry_a_message_field() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;

    let (status, body) = request(&app, Method::GET, "/api/roles/424242", Some(&token), None).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Role 424242 not found");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn token_for_deleted_user_stops_working() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, admin_token) = admin_with_token(&db).await;

    let user = create_test_user_with_role(&db, "gone@test.local", "user").await;
    let token = token_for(&user);

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/users/{}", user.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, 204);

    let (status, _) = request(&app, Method::GET, "/api/auth/user", Some(&token), None).await;
    assert_eq!(status, 401);
}

mod common;

use axum::http::Method;
use serde_json::json;

use common::*;

#[tokio::test]
async fn assign_and_remove_role_on_user() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;
    let user = create_test_user(&db, "promotee@test.local").await;

    let (_, roles) = request(&app, Method::GET, "/api/roles", Some(&token), None).await;
    let manager_role = roles
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "manager")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/api/users/{}/roles", user.id),
        Some(&token),
        Some(json!({ "role_id": manager_role })),
    )
    .await;
    assert_eq!(status, 201);

    // the derived display role follows the assignment
    let (_, fetched) = request(
        &app,
        Method::GET,
        &format!("/api/users/{}", user.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(fetched["role"], "manager");

    // assigning twice is a conflict
    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/api/users/{}/roles", user.id),
        Some(&token),
        Some(json!({ "role_id": manager_role })),
    )
    .await;
    assert_eq!(status, 409);

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/users/{}/roles/{manager_role}", user.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 204);

    let (_, listed) = request(
        &app,
        Method::GET,
        &format!("/api/users/{}/roles", user.id),
        Some(&token),
        None,
    )
    .await;
    assert!(listed.as_array().unwrap().is_empty());

    let (_, fetched) = request(
        &app,
        Method::GET,
        &format!("/api/users/{}", user.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(fetched["role"], "user");
}

#[tokio::test]
async fn assigning_unknown_role_is_404() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;
    let user = create_test_user(&db, "someone@test.local").await;

    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/api/users/{}/roles", user.id),
        Some(&token),
        Some(json!({ "role_id": 9999 })),
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/users/9999/roles",
        Some(&token),
        Some(json!({ "role_id": 1 })),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn application_grants_track_access_level_and_usage() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;
    let user = create_test_user(&db, "appuser@test.local").await;

    let (status, application) = request(
        &app,
        Method::POST,
        "/api/mini-applications",
        Some(&token),
        Some(json!({ "name": "Helpdesk", "category": "support", "icon": "headset" })),
    )
    .await;
    assert_eq!(status, 201);
    let app_id = application["id"].as_i64().unwrap();

    let (status, grant) = request(
        &app,
        Method::POST,
        &format!("/api/users/{}/applications", user.id),
        Some(&token),
        Some(json!({ "app_id": app_id, "access_level": "write" })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(grant["access_level"], "write");

    let (_, fetched) = request(
        &app,
        Method::GET,
        &format!("/api/mini-applications/{app_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(fetched["active_users"], 1);

    let (status, listed) = request(
        &app,
        Method::GET,
        &format!("/api/mini-applications/user/{}", user.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let grants = listed.as_array().unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0]["name"], "Helpdesk");
    assert_eq!(grants[0]["access_level"], "write");

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/users/{}/applications/{app_id}", user.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 204);

    let (_, listed) = request(
        &app,
        Method::GET,
        &format!("/api/mini-applications/user/{}", user.id),
        Some(&token),
        None,
    )
    .await;
    assert!(listed.as_array().unwrap().is_empty());

    let (_, fetched) = request(
        &app,
        Method::GET,
        &format!("/api/mini-applications/{app_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(fetched["active_users"], 0);
}

#[tokio::test]
async fn default_access_level_is_read_and_duplicates_conflict() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;
    let user = create_test_user(&db, "reader@test.local").await;

    let (_, application) = request(
        &app,
        Method::POST,
        "/api/mini-applications",
        Some(&token),
        Some(json!({ "name": "Docs", "category": "reference", "icon": "book" })),
    )
    .await;
    let app_id = application["id"].as_i64().unwrap();

    let (status, grant) = request(
        &app,
        Method::POST,
        &format!("/api/users/{}/applications", user.id),
        Some(&token),
        Some(json!({ "app_id": app_id })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(grant["access_level"], "read");

    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/api/users/{}/applications", user.id),
        Some(&token),
        Some(json!({ "app_id": app_id })),
    )
    .await;
    assert_eq!(status, 409);
}

#[tokio::test]
async fn bogus_access_level_is_rejected() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;
    let user = create_test_user(&db, "weird@test.local").await;

    let (_, application) = request(
        &app,
        Method::POST,
        "/api/mini-applications",
        Some(&token),
        Some(json!({ "name": "Vault", "category": "security", "icon": "lock" })),
    )
    .await;
    let app_id = application["id"].as_i64().unwrap();

    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/api/users/{}/applications", user.id),
        Some(&token),
        Some(json!({ "app_id": app_id, "access_level": "owner" })),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn deleting_user_releases_application_seats() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;
    let user = create_test_user(&db, "leaver@test.local").await;

    let (_, application) = request(
        &app,
        Method::POST,
        "/api/mini-applications",
        Some(&token),
        Some(json!({ "name": "CRM", "category": "sales", "icon": "chart" })),
    )
    .await;
    let app_id = application["id"].as_i64().unwrap();

    let (status, _) = request(
        &app,
        Method::POST,
        &format!("/api/users/{}/applications", user.id),
        Some(&token),
        Some(json!({ "app_id": app_id })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/users/{}", user.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 204);

    let (_, fetched) = request(
        &app,
        Method::GET,
        &format!("/api/mini-applications/{app_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(fetched["active_users"], 0);
}

mod common;

use axum::http::Method;
use serde_json::json;

use common::*;

#[tokio::test]
async fn statistics_reflect_stored_entities() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;

    let (_, dept) = request(
        &app,
        Method::POST,
        "/api/departments",
        Some(&token),
        Some(json!({ "name": "Engineering" })),
    )
    .await;
    let dept_id = dept["id"].as_i64().unwrap();

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/users",
        Some(&token),
        Some(json!({
            "email": "counted@test.local",
            "first_name": "Counted",
            "last_name": "User",
            "password": "password123",
            "department_id": dept_id
        })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/mini-applications",
        Some(&token),
        Some(json!({ "name": "Portal", "category": "misc", "icon": "door" })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, stats) = request(
        &app,
        Method::GET,
        "/api/analytics/statistics",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(stats["total_apps"], 1);
    // admin plus the created user
    assert_eq!(stats["active_users"], 2);
    assert_eq!(stats["departments"], 1);
    // the three seeded roles
    assert_eq!(stats["permission_groups"], 3);
}

#[tokio::test]
async fn statistics_skip_deactivated_users() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;

    let user = create_test_user(&db, "dormant@test.local").await;
    let (status, _) = request(
        &app,
        Method::PUT,
        &format!("/api/users/{}", user.id),
        Some(&token),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, 200);

    let (_, stats) = request(
        &app,
        Method::GET,
        "/api/analytics/statistics",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(stats["active_users"], 1);
}

#[tokio::test]
async fn activity_lists_newest_accounts_first_capped_at_five() {
    let db = create_test_db().await;
    let app = test_app(&db);
    let (_, token) = admin_with_token(&db).await;

    for i in 0..6 {
        let (status, _) = request(
            &app,
            Method::POST,
            "/api/users",
            Some(&token),
            Some(json!({
                "email": format!("wave{i}@test.local"),
                "first_name": "Wave",
                "last_name": format!("Member{i}"),
                "password": "password123"
            })),
        )
        .await;
        assert_eq!(status, 201);
    }

    let (status, body) = request(
        &app,
        Method::GET,
        "/api/analytics/activity",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["type"], "user_created");
    assert_eq!(items[0]["user"], "Wave Member5");
    assert_eq!(items[0]["action"], "was added to the system");
    assert_eq!(items[4]["user"], "Wave Member1");
}

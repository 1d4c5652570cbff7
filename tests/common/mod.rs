#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;

use atrium::application::state::AppState;
use atrium::endpoints::create_router;
use atrium::migrations::Migrator;
use atrium::models::prelude::*;
use atrium::services::{bootstrap, security};

/// Fresh in-memory database with migrations applied and default
/// roles/permissions seeded.
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None).await.expect("migrations failed");
    bootstrap::seed_defaults(&db).await.expect("seeding failed");
    db
}

pub fn test_app(db: &DatabaseConnection) -> Router {
    create_router(AppState::new(db.clone()))
}

pub const TEST_PASSWORD: &str = "password123";

pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        email: Set(email.to_owned()),
        first_name: Set("Test".to_owned()),
        last_name: Set("User".to_owned()),
        // low cost keeps the suite fast
        hashed_password: Set(bcrypt::hash(TEST_PASSWORD, 4).unwrap()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert test user")
}

pub async fn create_test_user_with_role(
    db: &DatabaseConnection,
    email: &str,
    role_name: &str,
) -> user::Model {
    let user = create_test_user(db, email).await;
    assign_role_by_name(db, user.id, role_name).await;
    user
}

pub async fn assign_role_by_name(db: &DatabaseConnection, user_id: i64, role_name: &str) {
    let role = Role::find()
        .filter(role::Column::Name.eq(role_name))
        .one(db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("role {role_name} not seeded"));
    user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role.id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("failed to assign role");
}

/// Admin account plus a bearer token for it.
pub async fn admin_with_token(db: &DatabaseConnection) -> (user::Model, String) {
    let admin = create_test_user_with_role(db, "admin@test.local", "admin").await;
    let token = security::create_access_token(admin.id, &admin.email).unwrap();
    (admin, token)
}

pub fn token_for(user: &user::Model) -> String {
    security::create_access_token(user.id, &user.email).unwrap()
}

/// Sends a request and returns (status, parsed JSON body). Empty bodies
/// come back as `Value::Null`.
pub async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

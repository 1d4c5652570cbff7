use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::application::error::{AppError, Result};
use crate::application::state::{AppState, DbConn};
use crate::endpoints::extractors::require_permission;
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;

const STATUSES: &[&str] = &["active", "maintenance", "inactive", "development"];

fn validate_status(status: &str) -> Result<()> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid status {status:?}, expected one of active, maintenance, inactive, development"
        )))
    }
}

async fn find_application(db: &DbConn, id: i64) -> Result<mini_application::Model> {
    MiniApplication::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<mini_application::Model>>> {
    require_permission(&state.db, current.id, "applications", "view").await?;

    let applications = MiniApplication::find()
        .order_by_asc(mini_application::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(applications))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Case-insensitive substring search over name and description.
pub async fn search_applications(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<mini_application::Model>>> {
    require_permission(&state.db, current.id, "applications", "view").await?;

    let needle = query.q.trim().to_lowercase();
    if needle.is_empty() {
        return Err(AppError::BadRequest("Query parameter required".into()));
    }
    let pattern = format!("%{needle}%");
    let applications = MiniApplication::find()
        .filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(mini_application::Column::Name)))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(mini_application::Column::Description)))
                        .like(pattern),
                ),
        )
        .order_by_asc(mini_application::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(applications))
}

/// Application grant as returned to clients: the catalog entry with the
/// granted access level attached.
#[derive(Debug, Serialize)]
pub struct ApplicationGrant {
    #[serde(flatten)]
    pub application: mini_application::Model,
    pub access_level: String,
}

pub async fn list_for_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<ApplicationGrant>>> {
    require_permission(&state.db, current.id, "applications", "view").await?;
    if User::find_by_id(user_id).one(&state.db).await?.is_none() {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }

    let grants = UserMiniApplication::find()
        .filter(user_mini_application::Column::UserId.eq(user_id))
        .all(&state.db)
        .await?;
    if grants.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let app_ids: Vec<i64> = grants.iter().map(|g| g.mini_application_id).collect();
    let apps = MiniApplication::find()
        .filter(mini_application::Column::Id.is_in(app_ids))
        .order_by_asc(mini_application::Column::Id)
        .all(&state.db)
        .await?;

    let out = apps
        .into_iter()
        .filter_map(|app| {
            grants
                .iter()
                .find(|g| g.mini_application_id == app.id)
                .map(|g| ApplicationGrant {
                    access_level: g.access_level.clone(),
                    application: app,
                })
        })
        .collect();
    Ok(Json(out))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplicationRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Category must not be empty"))]
    pub category: String,
    #[validate(length(min = 1, message = "Icon must not be empty"))]
    pub icon: String,
    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
    pub status: Option<String>,
}

pub async fn create_application(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<mini_application::Model>)> {
    require_permission(&state.db, current.id, "applications", "manage").await?;
    payload.validate()?;

    let status = payload.status.unwrap_or_else(|| "active".to_owned());
    validate_status(&status)?;

    let now = Utc::now();
    let application = mini_application::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        category: Set(payload.category),
        icon: Set(payload.icon),
        url: Set(payload.url),
        status: Set(status),
        active_users: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(application_id = application.id, "created application");
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn get_application(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<mini_application::Model>> {
    require_permission(&state.db, current.id, "applications", "view").await?;
    Ok(Json(find_application(&state.db, id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateApplicationRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Category must not be empty"))]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "Icon must not be empty"))]
    pub icon: Option<String>,
    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
    pub status: Option<String>,
}

pub async fn update_application(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateApplicationRequest>,
) -> Result<Json<mini_application::Model>> {
    require_permission(&state.db, current.id, "applications", "manage").await?;
    payload.validate()?;
    if let Some(status) = payload.status.as_deref() {
        validate_status(status)?;
    }

    let application = find_application(&state.db, id).await?;
    let mut active: mini_application::ActiveModel = application.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(icon) = payload.icon {
        active.icon = Set(icon);
    }
    if let Some(url) = payload.url {
        active.url = Set(Some(url));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now());

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    require_permission(&state.db, current.id, "applications", "manage").await?;
    let application = find_application(&state.db, id).await?;

    UserMiniApplication::delete_many()
        .filter(user_mini_application::Column::MiniApplicationId.eq(application.id))
        .exec(&state.db)
        .await?;
    MiniApplication::delete_by_id(application.id)
        .exec(&state.db)
        .await?;
    info!(application_id = application.id, "deleted application");
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::application::error::{AppError, Result};
use crate::application::state::{AppState, DbConn};
use crate::endpoints::extractors::require_permission;
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;

async fn find_permission(db: &DbConn, id: i64) -> Result<permission::Model> {
    Permission::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Permission {id} not found")))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<permission::Model>>> {
    require_permission(&state.db, current.id, "permissions", "view").await?;
    let permissions = Permission::find()
        .order_by_asc(permission::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(permissions))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Resource must not be empty"))]
    pub resource: String,
    #[validate(length(min = 1, message = "Action must not be empty"))]
    pub action: String,
    pub is_active: Option<bool>,
}

pub async fn create_permission(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Json(payload): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<permission::Model>)> {
    require_permission(&state.db, current.id, "permissions", "manage").await?;
    payload.validate()?;

    let existing = Permission::find()
        .filter(permission::Column::Name.eq(payload.name.as_str()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "A permission named {} already exists",
            payload.name
        )));
    }

    let permission = permission::ActiveModel {
        name: Set(payload.name),
        resource: Set(payload.resource),
        action: Set(payload.action),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(permission_id = permission.id, "created permission");
    Ok((StatusCode::CREATED, Json(permission)))
}

pub async fn get_permission(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<permission::Model>> {
    require_permission(&state.db, current.id, "permissions", "view").await?;
    Ok(Json(find_permission(&state.db, id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePermissionRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Resource must not be empty"))]
    pub resource: Option<String>,
    #[validate(length(min = 1, message = "Action must not be empty"))]
    pub action: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_permission(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> Result<Json<permission::Model>> {
    require_permission(&state.db, current.id, "permissions", "manage").await?;
    payload.validate()?;

    let permission = find_permission(&state.db, id).await?;
    if let Some(name) = payload.name.as_deref() {
        let taken = Permission::find()
            .filter(permission::Column::Name.eq(name))
            .filter(permission::Column::Id.ne(id))
            .one(&state.db)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(format!(
                "A permission named {name} already exists"
            )));
        }
    }

    let mut active: permission::ActiveModel = permission.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(resource) = payload.resource {
        active.resource = Set(resource);
    }
    if let Some(action) = payload.action {
        active.action = Set(action);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_permission(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    require_permission(&state.db, current.id, "permissions", "manage").await?;
    let permission = find_permission(&state.db, id).await?;

    RolePermission::delete_many()
        .filter(role_permission::Column::PermissionId.eq(permission.id))
        .exec(&state.db)
        .await?;
    Permission::delete_by_id(permission.id).exec(&state.db).await?;
    info!(permission_id = permission.id, "deleted permission");
    Ok(StatusCode::NO_CONTENT)
}

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

async fn find_role(db: &DbConn, id: i64) -> Result<role::Model> {
    Role::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Role {id} not found")))
}

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<role::Model>>> {
    require_permission(&state.db, current.id, "roles", "view").await?;
    let roles = Role::find()
        .order_by_asc(role::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(roles))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn create_role(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<role::Model>)> {
    require_permission(&state.db, current.id, "roles", "manage").await?;
    payload.validate()?;

    let existing = Role::find()
        .filter(role::Column::Name.eq(payload.name.as_str()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "A role named {} already exists",
            payload.name
        )));
    }

    let now = Utc::now();
    let role = role::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(role_id = role.id, "created role");
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn get_role(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<role::Model>> {
    require_permission(&state.db, current.id, "roles", "view").await?;
    Ok(Json(find_role(&state.db, id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_role(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<role::Model>> {
    require_permission(&state.db, current.id, "roles", "manage").await?;
    payload.validate()?;

    let role = find_role(&state.db, id).await?;
    if let Some(name) = payload.name.as_deref() {
        let taken = Role::find()
            .filter(role::Column::Name.eq(name))
            .filter(role::Column::Id.ne(id))
            .one(&state.db)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(format!(
                "A role named {name} already exists"
            )));
        }
    }

    let mut active: role::ActiveModel = role.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    require_permission(&state.db, current.id, "roles", "manage").await?;
    let role = find_role(&state.db, id).await?;

    UserRole::delete_many()
        .filter(user_role::Column::RoleId.eq(role.id))
        .exec(&state.db)
        .await?;
    RolePermission::delete_many()
        .filter(role_permission::Column::RoleId.eq(role.id))
        .exec(&state.db)
        .await?;
    Role::delete_by_id(role.id).exec(&state.db).await?;
    info!(role_id = role.id, "deleted role");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_role_permissions(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(role_id): Path<i64>,
) -> Result<Json<Vec<permission::Model>>> {
    require_permission(&state.db, current.id, "roles", "view").await?;
    find_role(&state.db, role_id).await?;

    let permission_ids: Vec<i64> = RolePermission::find()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|rp| rp.permission_id)
        .collect();
    if permission_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let permissions = Permission::find()
        .filter(permission::Column::Id.is_in(permission_ids))
        .order_by_asc(permission::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(permissions))
}

#[derive(Debug, Deserialize)]
pub struct GrantPermissionRequest {
    pub permission_id: i64,
}

pub async fn grant_permission(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(role_id): Path<i64>,
    Json(payload): Json<GrantPermissionRequest>,
) -> Result<(StatusCode, Json<role_permission::Model>)> {
    require_permission(&state.db, current.id, "roles", "manage").await?;
    let role = find_role(&state.db, role_id).await?;

    let permission = Permission::find_by_id(payload.permission_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Permission {} not found", payload.permission_id))
        })?;

    let existing = RolePermission::find()
        .filter(role_permission::Column::RoleId.eq(role.id))
        .filter(role_permission::Column::PermissionId.eq(permission.id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Role {} already has permission {}",
            role.name, permission.name
        )));
    }

    let grant = role_permission::ActiveModel {
        role_id: Set(role.id),
        permission_id: Set(permission.id),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await?;
    info!(role_id = role.id, permission_id = permission.id, "granted permission");
    Ok((StatusCode::CREATED, Json(grant)))
}

pub async fn revoke_permission(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path((role_id, permission_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    require_permission(&state.db, current.id, "roles", "manage").await?;

    let grant = RolePermission::find()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .filter(role_permission::Column::PermissionId.eq(permission_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Role {role_id} does not have permission {permission_id}"
            ))
        })?;

    RolePermission::delete_many()
        .filter(role_permission::Column::RoleId.eq(grant.role_id))
        .filter(role_permission::Column::PermissionId.eq(grant.permission_id))
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

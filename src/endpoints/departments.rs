use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::application::error::{AppError, Result};
use crate::application::state::{AppState, DbConn};
use crate::endpoints::extractors::require_permission;
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;

/// Department plus the number of users currently assigned to it.
#[derive(Debug, Serialize)]
pub struct DepartmentResponse {
    #[serde(flatten)]
    pub department: department::Model,
    pub user_count: u64,
}

async fn with_user_count(db: &DbConn, department: department::Model) -> Result<DepartmentResponse> {
    let user_count = User::find()
        .filter(user::Column::DepartmentId.eq(department.id))
        .count(db)
        .await?;
    Ok(DepartmentResponse {
        department,
        user_count,
    })
}

async fn find_department(db: &DbConn, id: i64) -> Result<department::Model> {
    Department::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Department {id} not found")))
}

pub async fn list_departments(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<DepartmentResponse>>> {
    require_permission(&state.db, current.id, "departments", "view").await?;

    let departments = Department::find()
        .order_by_asc(department::Column::Id)
        .all(&state.db)
        .await?;
    let mut out = Vec::with_capacity(departments.len());
    for d in departments {
        out.push(with_user_count(&state.db, d).await?);
    }
    Ok(Json(out))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<i64>,
    pub is_active: Option<bool>,
}

pub async fn create_department(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<DepartmentResponse>)> {
    require_permission(&state.db, current.id, "departments", "manage").await?;
    payload.validate()?;

    if let Some(manager_id) = payload.manager_id {
        if User::find_by_id(manager_id).one(&state.db).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "User {manager_id} does not exist"
            )));
        }
    }

    let now = Utc::now();
    let department = department::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        manager_id: Set(payload.manager_id),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(department_id = department.id, "created department");
    Ok((
        StatusCode::CREATED,
        Json(with_user_count(&state.db, department).await?),
    ))
}

pub async fn get_department(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<DepartmentResponse>> {
    require_permission(&state.db, current.id, "departments", "view").await?;
    let department = find_department(&state.db, id).await?;
    Ok(Json(with_user_count(&state.db, department).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub manager_id: Option<i64>,
    pub is_active: Option<bool>,
}

pub async fn update_department(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDepartmentRequest>,
) -> Result<Json<DepartmentResponse>> {
    require_permission(&state.db, current.id, "departments", "manage").await?;
    payload.validate()?;

    let department = find_department(&state.db, id).await?;
    if let Some(manager_id) = payload.manager_id {
        if User::find_by_id(manager_id).one(&state.db).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "User {manager_id} does not exist"
            )));
        }
    }

    let mut active: department::ActiveModel = department.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(manager_id) = payload.manager_id {
        active.manager_id = Set(Some(manager_id));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let department = active.update(&state.db).await?;
    Ok(Json(with_user_count(&state.db, department).await?))
}

pub async fn delete_department(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    require_permission(&state.db, current.id, "departments", "manage").await?;
    let department = find_department(&state.db, id).await?;

    // Users keep existing but lose their department assignment.
    User::update_many()
        .col_expr(user::Column::DepartmentId, Expr::value(Option::<i64>::None))
        .filter(user::Column::DepartmentId.eq(department.id))
        .exec(&state.db)
        .await?;

    Department::delete_by_id(department.id).exec(&state.db).await?;
    info!(department_id = department.id, "deleted department");
    Ok(StatusCode::NO_CONTENT)
}

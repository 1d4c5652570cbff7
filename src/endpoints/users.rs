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
use crate::endpoints::extractors::{display_role, get_user_role_names, require_permission};
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;
use crate::services::security;

/// Account plus its derived display role.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: user::Model,
    pub role: String,
}

async fn with_role(db: &DbConn, user: user::Model) -> Result<UserResponse> {
    let role_names = get_user_role_names(db, user.id).await?;
    Ok(UserResponse {
        role: display_role(&role_names).to_owned(),
        user,
    })
}

async fn find_user(db: &DbConn, id: i64) -> Result<user::Model> {
    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub department_id: Option<i64>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    require_permission(&state.db, current.id, "users", "view").await?;

    let mut select = User::find().order_by_asc(user::Column::Id);
    if let Some(department_id) = query.department_id {
        select = select.filter(user::Column::DepartmentId.eq(department_id));
    }

    let users = select.all(&state.db).await?;
    let mut out = Vec::with_capacity(users.len());
    for u in users {
        out.push(with_role(&state.db, u).await?);
    }
    Ok(Json(out))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Case-insensitive substring search over first name, last name and email.
pub async fn search_users(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    require_permission(&state.db, current.id, "users", "view").await?;

    let needle = query.q.trim().to_lowercase();
    if needle.is_empty() {
        return Err(AppError::BadRequest("Query parameter required".into()));
    }
    let pattern = format!("%{needle}%");
    let users = User::find()
        .filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(user::Column::FirstName)))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(user::Column::LastName)))
                        .like(pattern.clone()),
                )
                .add(Expr::expr(Func::lower(Expr::col(user::Column::Email))).like(pattern)),
        )
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;

    let mut out = Vec::with_capacity(users.len());
    for u in users {
        out.push(with_role(&state.db, u).await?);
    }
    Ok(Json(out))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "First name must not be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name must not be empty"))]
    pub last_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub profile_image_url: Option<String>,
    pub department_id: Option<i64>,
    pub is_active: Option<bool>,
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    require_permission(&state.db, current.id, "users", "manage").await?;
    payload.validate()?;

    let existing = User::find()
        .filter(user::Column::Email.eq(payload.email.as_str()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "A user with email {} already exists",
            payload.email
        )));
    }
    if let Some(department_id) = payload.department_id {
        if Department::find_by_id(department_id).one(&state.db).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Department {department_id} does not exist"
            )));
        }
    }

    let now = Utc::now();
    let user = user::ActiveModel {
        email: Set(payload.email),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        profile_image_url: Set(payload.profile_image_url),
        hashed_password: Set(security::hash_password(&payload.password)?),
        department_id: Set(payload.department_id),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(user_id = user.id, "created user");
    Ok((StatusCode::CREATED, Json(with_role(&state.db, user).await?)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    require_permission(&state.db, current.id, "users", "view").await?;
    let user = find_user(&state.db, id).await?;
    Ok(Json(with_role(&state.db, user).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "First name must not be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "Last name must not be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub profile_image_url: Option<String>,
    pub department_id: Option<i64>,
    pub is_active: Option<bool>,
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    require_permission(&state.db, current.id, "users", "manage").await?;
    payload.validate()?;

    let user = find_user(&state.db, id).await?;

    if let Some(email) = payload.email.as_deref() {
        let taken = User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Id.ne(id))
            .one(&state.db)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(format!(
                "A user with email {email} already exists"
            )));
        }
    }
    if let Some(department_id) = payload.department_id {
        if Department::find_by_id(department_id).one(&state.db).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Department {department_id} does not exist"
            )));
        }
    }

    let mut active: user::ActiveModel = user.into();
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(password) = payload.password {
        active.hashed_password = Set(security::hash_password(&password)?);
    }
    if let Some(profile_image_url) = payload.profile_image_url {
        active.profile_image_url = Set(Some(profile_image_url));
    }
    if let Some(department_id) = payload.department_id {
        active.department_id = Set(Some(department_id));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let user = active.update(&state.db).await?;
    Ok(Json(with_role(&state.db, user).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    require_permission(&state.db, current.id, "users", "manage").await?;
    let user = find_user(&state.db, id).await?;

    // Remove the user's edges before the row itself so no dangling
    // references survive regardless of backend cascade behavior.
    let grants = UserMiniApplication::find()
        .filter(user_mini_application::Column::UserId.eq(user.id))
        .all(&state.db)
        .await?;
    for grant in &grants {
        decrement_active_users(&state.db, grant.mini_application_id).await?;
    }
    UserMiniApplication::delete_many()
        .filter(user_mini_application::Column::UserId.eq(user.id))
        .exec(&state.db)
        .await?;
    UserRole::delete_many()
        .filter(user_role::Column::UserId.eq(user.id))
        .exec(&state.db)
        .await?;
    Department::update_many()
        .col_expr(department::Column::ManagerId, Expr::value(Option::<i64>::None))
        .filter(department::Column::ManagerId.eq(user.id))
        .exec(&state.db)
        .await?;

    User::delete_by_id(user.id).exec(&state.db).await?;
    info!(user_id = user.id, "deleted user");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_roles(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<role::Model>>> {
    require_permission(&state.db, current.id, "users", "view").await?;
    find_user(&state.db, user_id).await?;

    let roles = Role::find()
        .inner_join(UserRole)
        .filter(user_role::Column::UserId.eq(user_id))
        .order_by_asc(role::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(roles))
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: i64,
}

pub async fn assign_role(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<(StatusCode, Json<user_role::Model>)> {
    require_permission(&state.db, current.id, "users", "manage").await?;
    find_user(&state.db, user_id).await?;

    let role = Role::find_by_id(payload.role_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Role {} not found", payload.role_id)))?;

    let existing = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::RoleId.eq(role.id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "User {user_id} already has role {}",
            role.name
        )));
    }

    let assignment = user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role.id),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await?;
    info!(user_id, role_id = role.id, "assigned role");
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn remove_role(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path((user_id, role_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    require_permission(&state.db, current.id, "users", "manage").await?;

    let assignment = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::RoleId.eq(role_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("User {user_id} does not have role {role_id}"))
        })?;

    UserRole::delete_many()
        .filter(user_role::Column::UserId.eq(assignment.user_id))
        .filter(user_role::Column::RoleId.eq(assignment.role_id))
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

const ACCESS_LEVELS: &[&str] = &["read", "write", "admin"];

#[derive(Debug, Deserialize)]
pub struct AssignApplicationRequest {
    pub app_id: i64,
    pub access_level: Option<String>,
}

pub async fn assign_application(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
    Json(payload): Json<AssignApplicationRequest>,
) -> Result<(StatusCode, Json<user_mini_application::Model>)> {
    require_permission(&state.db, current.id, "users", "manage").await?;
    find_user(&state.db, user_id).await?;

    let access_level = payload.access_level.unwrap_or_else(|| "read".to_owned());
    if !ACCESS_LEVELS.contains(&access_level.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Invalid access level {access_level:?}, expected one of read, write, admin"
        )));
    }

    let app = MiniApplication::find_by_id(payload.app_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Application {} not found", payload.app_id))
        })?;

    let existing = UserMiniApplication::find()
        .filter(user_mini_application::Column::UserId.eq(user_id))
        .filter(user_mini_application::Column::MiniApplicationId.eq(app.id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "User {user_id} is already assigned to {}",
            app.name
        )));
    }

    let grant = user_mini_application::ActiveModel {
        user_id: Set(user_id),
        mini_application_id: Set(app.id),
        access_level: Set(access_level),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await?;

    let mut active: mini_application::ActiveModel = app.clone().into();
    active.active_users = Set(app.active_users + 1);
    active.update(&state.db).await?;

    info!(user_id, application_id = app.id, "assigned application");
    Ok((StatusCode::CREATED, Json(grant)))
}

pub async fn remove_application(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path((user_id, application_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    require_permission(&state.db, current.id, "users", "manage").await?;

    let grant = UserMiniApplication::find()
        .filter(user_mini_application::Column::UserId.eq(user_id))
        .filter(user_mini_application::Column::MiniApplicationId.eq(application_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "User {user_id} is not assigned to application {application_id}"
            ))
        })?;

    UserMiniApplication::delete_many()
        .filter(user_mini_application::Column::UserId.eq(grant.user_id))
        .filter(user_mini_application::Column::MiniApplicationId.eq(grant.mini_application_id))
        .exec(&state.db)
        .await?;
    decrement_active_users(&state.db, application_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn decrement_active_users(db: &DbConn, application_id: i64) -> Result<()> {
    if let Some(app) = MiniApplication::find_by_id(application_id).one(db).await? {
        let mut active: mini_application::ActiveModel = app.clone().into();
        active.active_users = Set((app.active_users - 1).max(0));
        active.update(db).await?;
    }
    Ok(())
}

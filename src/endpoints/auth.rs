use axum::{extract::State, http::StatusCode, Extension, Json};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::application::error::{AppError, Result};
use crate::application::state::{AppState, DbConn};
use crate::endpoints::extractors::{display_role, get_user_permissions, get_user_role_names};
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;
use crate::services::security;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserProfile,
}

/// Account plus its derived role and effective permission names.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: user::Model,
    pub role: String,
    pub permissions: Vec<String>,
}

pub async fn build_profile(db: &DbConn, user: user::Model) -> Result<UserProfile> {
    let role_names = get_user_role_names(db, user.id).await?;
    let permissions = get_user_permissions(db, user.id).await?;
    Ok(UserProfile {
        role: display_role(&role_names).to_owned(),
        permissions,
        user,
    })
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    payload.validate()?;

    let user = User::find()
        .filter(user::Column::Email.eq(payload.email.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    if !security::verify_password(&payload.password, &user.hashed_password)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }
    if !user.is_active {
        return Err(AppError::Unauthorized("Account is deactivated".into()));
    }

    let access_token = security::create_access_token(user.id, &user.email)?;
    info!(user_id = user.id, "user logged in");

    let user = build_profile(&state.db, user).await?;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        user,
    }))
}

/// Tokens are stateless, so logout is a client-side discard. The endpoint
/// exists so clients have a uniform call to make.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Result<Json<UserProfile>> {
    Ok(Json(build_profile(&state.db, user).await?))
}

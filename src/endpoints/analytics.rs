use axum::{extract::State, Extension, Json};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;

use crate::application::error::Result;
use crate::application::state::AppState;
use crate::endpoints::extractors::require_permission;
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;

#[derive(Debug, Serialize)]
pub struct Statistics {
    pub total_apps: u64,
    pub active_users: u64,
    pub departments: u64,
    pub permission_groups: u64,
}

pub async fn statistics(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
) -> Result<Json<Statistics>> {
    require_permission(&state.db, current.id, "analytics", "view").await?;

    let total_apps = MiniApplication::find().count(&state.db).await?;
    let active_users = User::find()
        .filter(user::Column::IsActive.eq(true))
        .count(&state.db)
        .await?;
    let departments = Department::find().count(&state.db).await?;
    let permission_groups = Role::find().count(&state.db).await?;

    Ok(Json(Statistics {
        total_apps,
        active_users,
        departments,
        permission_groups,
    }))
}

#[derive(Debug, Serialize)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub user: String,
    pub action: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// The five most recently created accounts, newest first.
pub async fn recent_activity(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<ActivityItem>>> {
    require_permission(&state.db, current.id, "analytics", "view").await?;

    let users = User::find()
        .order_by_desc(user::Column::CreatedAt)
        .limit(5)
        .all(&state.db)
        .await?;

    let items = users
        .into_iter()
        .map(|u| ActivityItem {
            kind: "user_created",
            user: format!("{} {}", u.first_name, u.last_name),
            action: "was added to the system",
            timestamp: u.created_at,
        })
        .collect();
    Ok(Json(items))
}

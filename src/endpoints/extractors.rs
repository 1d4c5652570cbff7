//! Helpers shared by the endpoint handlers: role resolution and
//! permission checks against the role/permission tables.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::application::error::{AppError, Result};
use crate::application::state::DbConn;
use crate::models::prelude::*;

/// Role names assigned to a user, active roles only.
pub async fn get_user_role_names(db: &DbConn, user_id: i64) -> Result<Vec<String>> {
    let role_ids: Vec<i64> = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|ur| ur.role_id)
        .collect();
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }
    let roles = Role::find()
        .filter(role::Column::Id.is_in(role_ids))
        .filter(role::Column::IsActive.eq(true))
        .all(db)
        .await?;
    Ok(roles.into_iter().map(|r| r.name).collect())
}

/// Single display role derived from the assigned roles, most privileged
/// first. Users without any role assignment read as "user".
pub fn display_role(role_names: &[String]) -> &'static str {
    if role_names.iter().any(|r| r == "admin") {
        "admin"
    } else if role_names.iter().any(|r| r == "manager") {
        "manager"
    } else {
        "user"
    }
}

/// Permission names granted to a user through any of its active roles.
pub async fn get_user_permissions(db: &DbConn, user_id: i64) -> Result<Vec<String>> {
    let role_ids: Vec<i64> = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|ur| ur.role_id)
        .collect();
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }
    let active_role_ids: Vec<i64> = Role::find()
        .filter(role::Column::Id.is_in(role_ids))
        .filter(role::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    if active_role_ids.is_empty() {
        return Ok(Vec::new());
    }
    let permission_ids: Vec<i64> = RolePermission::find()
        .filter(role_permission::Column::RoleId.is_in(active_role_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|rp| rp.permission_id)
        .collect();
    if permission_ids.is_empty() {
        return Ok(Vec::new());
    }
    let permissions = Permission::find()
        .filter(permission::Column::Id.is_in(permission_ids))
        .filter(permission::Column::IsActive.eq(true))
        .all(db)
        .await?;
    let mut names: Vec<String> = permissions.into_iter().map(|p| p.name).collect();
    names.sort();
    names.dedup();
    Ok(names)
}

pub async fn user_has_permission(
    db: &DbConn,
    user_id: i64,
    resource: &str,
    action: &str,
) -> Result<bool> {
    let wanted = format!("{resource}.{action}");
    let names = get_user_permissions(db, user_id).await?;
    Ok(names.iter().any(|n| n == &wanted))
}

/// Rejects with 403 unless the user holds `<resource>.<action>`.
pub async fn require_permission(
    db: &DbConn,
    user_id: i64,
    resource: &str,
    action: &str,
) -> Result<()> {
    if user_has_permission(db, user_id, resource, action).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Missing permission {resource}.{action}"
        )))
    }
}

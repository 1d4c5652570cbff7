//! Idempotent startup seeding: default roles, the permission catalog,
//! role grants, and the initial administrator account.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::info;

use crate::application::config::CONFIG;
use crate::application::error::Result;
use crate::application::state::DbConn;
use crate::models::prelude::*;
use crate::services::security;

const DEFAULT_ROLES: &[(&str, &str)] = &[
    ("admin", "Full administrative access"),
    ("manager", "Manage users and applications within scope"),
    ("user", "Standard access to assigned applications"),
];

/// Catalog of (resource, action) permissions.
const PERMISSION_CATALOG: &[(&str, &str)] = &[
    ("users", "view"),
    ("users", "manage"),
    ("departments", "view"),
    ("departments", "manage"),
    ("roles", "view"),
    ("roles", "manage"),
    ("permissions", "view"),
    ("permissions", "manage"),
    ("applications", "view"),
    ("applications", "manage"),
    ("analytics", "view"),
];

fn role_grants(role: &str, resource: &str, action: &str) -> bool {
    match role {
        "admin" => true,
        "manager" => {
            action == "view"
                || matches!(resource, "users" | "departments" | "applications")
        }
        "user" => {
            matches!((resource, action), ("applications", "view") | ("analytics", "view"))
        }
        _ => false,
    }
}

/// Seeds roles, permissions and grants that are missing. Safe to run on
/// every startup.
pub async fn seed_defaults(db: &DbConn) -> Result<()> {
    let now = Utc::now();

    for (name, description) in DEFAULT_ROLES {
        let existing = Role::find()
            .filter(role::Column::Name.eq(*name))
            .one(db)
            .await?;
        if existing.is_none() {
            role::ActiveModel {
                name: Set((*name).to_owned()),
                description: Set(Some((*description).to_owned())),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!(role = name, "seeded default role");
        }
    }

    for (resource, action) in PERMISSION_CATALOG {
        let name = format!("{resource}.{action}");
        let existing = Permission::find()
            .filter(permission::Column::Name.eq(name.as_str()))
            .one(db)
            .await?;
        if existing.is_none() {
            permission::ActiveModel {
                name: Set(name.clone()),
                resource: Set((*resource).to_owned()),
                action: Set((*action).to_owned()),
                is_active: Set(true),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    let roles = Role::find().all(db).await?;
    let permissions = Permission::find().all(db).await?;
    for r in &roles {
        for p in &permissions {
            if !role_grants(&r.name, &p.resource, &p.action) {
                continue;
            }
            let existing = RolePermission::find()
                .filter(role_permission::Column::RoleId.eq(r.id))
                .filter(role_permission::Column::PermissionId.eq(p.id))
                .one(db)
                .await?;
            if existing.is_none() {
                role_permission::ActiveModel {
                    role_id: Set(r.id),
                    permission_id: Set(p.id),
                    created_at: Set(now),
                }
                .insert(db)
                .await?;
            }
        }
    }

    Ok(())
}

/// Creates the configured administrator account if no user holds the admin
/// role yet, and grants it that role.
pub async fn ensure_admin_account(db: &DbConn) -> Result<()> {
    let admin_role = Role::find()
        .filter(role::Column::Name.eq("admin"))
        .one(db)
        .await?;
    let Some(admin_role) = admin_role else {
        return Ok(());
    };

    let has_admin = UserRole::find()
        .filter(user_role::Column::RoleId.eq(admin_role.id))
        .one(db)
        .await?
        .is_some();
    if has_admin {
        return Ok(());
    }

    let now = Utc::now();
    let existing = User::find()
        .filter(user::Column::Email.eq(CONFIG.auth.admin_email.as_str()))
        .one(db)
        .await?;
    let admin_user = match existing {
        Some(u) => u,
        None => {
            user::ActiveModel {
                email: Set(CONFIG.auth.admin_email.clone()),
                first_name: Set("System".to_owned()),
                last_name: Set("Administrator".to_owned()),
                hashed_password: Set(security::hash_password(&CONFIG.auth.admin_password)?),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    user_role::ActiveModel {
        user_id: Set(admin_user.id),
        role_id: Set(admin_role.id),
        created_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(email = %admin_user.email, "created initial admin account");

    Ok(())
}

pub async fn run(db: &DbConn) -> Result<()> {
    seed_defaults(db).await?;
    ensure_admin_account(db).await?;
    Ok(())
}

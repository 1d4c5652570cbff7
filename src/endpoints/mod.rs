pub mod analytics;
pub mod auth;
pub mod departments;
pub mod extractors;
pub mod mini_applications;
pub mod permissions;
pub mod roles;
pub mod users;

use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use crate::application::config::CONFIG;
use crate::application::state::AppState;
use crate::middleware::require_auth;

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": CONFIG.version }))
}

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let protected = Router::new()
        .route("/api/auth/user", get(auth::current_user))
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/api/users/search", get(users::search_users))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/users/{user_id}/roles",
            get(users::list_user_roles).post(users::assign_role),
        )
        .route(
            "/api/users/{user_id}/roles/{role_id}",
            delete(users::remove_role),
        )
        .route(
            "/api/users/{user_id}/applications",
            post(users::assign_application),
        )
        .route(
            "/api/users/{user_id}/applications/{application_id}",
            delete(users::remove_application),
        )
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/api/departments/{id}",
            get(departments::get_department)
                .put(departments::update_department)
                .delete(departments::delete_department),
        )
        .route(
            "/api/roles",
            get(roles::list_roles).post(roles::create_role),
        )
        .route(
            "/api/roles/{id}",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            get(roles::list_role_permissions).post(roles::grant_permission),
        )
        .route(
            "/api/roles/{role_id}/permissions/{permission_id}",
            delete(roles::revoke_permission),
        )
        .route(
            "/api/permissions",
            get(permissions::list_permissions).post(permissions::create_permission),
        )
        .route(
            "/api/permissions/{id}",
            get(permissions::get_permission)
                .put(permissions::update_permission)
                .delete(permissions::delete_permission),
        )
        .route(
            "/api/mini-applications",
            get(mini_applications::list_applications)
                .post(mini_applications::create_application),
        )
        .route(
            "/api/mini-applications/search",
            get(mini_applications::search_applications),
        )
        .route(
            "/api/mini-applications/user/{user_id}",
            get(mini_applications::list_for_user),
        )
        .route(
            "/api/mini-applications/{id}",
            get(mini_applications::get_application)
                .put(mini_applications::update_application)
                .delete(mini_applications::delete_application),
        )
        .route("/api/analytics/statistics", get(analytics::statistics))
        .route("/api/analytics/activity", get(analytics::recent_activity))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public.merge(protected).with_state(state)
}

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sea_orm::EntityTrait;

use crate::application::error::AppError;
use crate::application::state::AppState;
use crate::models::prelude::*;
use crate::services::security;

/// The resolved account for the request, inserted as an extension by
/// [`require_auth`].
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub user::Model);

/// Requires a valid `Authorization: Bearer <token>` header, loads the
/// account it names and rejects tokens for unknown or deactivated users.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

    let claims = security::decode_token(token)?;

    let user = User::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;
    if !user.is_active {
        return Err(AppError::Unauthorized("Account is deactivated".into()));
    }

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::decode_access_token;
use crate::db::{AppState, queries};
use crate::error::{AppError, msg};
use crate::models::User;
use crate::util::extract_bearer_token;

/// The authenticated user for this request, inserted by [`require_user`]
/// and [`require_admin`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the bearer token to a live user row.
///
/// A valid token whose user has since been deleted is still unauthorized.
fn lookup_user(state: &AppState, request: &Request) -> Result<User, AppError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized(msg::UNAUTHORIZED.into()))?;

    let claims = decode_access_token(token, &state.jwt_secret)
        .ok_or_else(|| AppError::Unauthorized(msg::UNAUTHORIZED.into()))?;

    let conn = state.db.get()?;
    queries::get_user_by_email(&conn, &claims.sub)?
        .ok_or_else(|| AppError::Unauthorized(msg::UNAUTHORIZED.into()))
}

/// Require a valid access token. Inserts [`CurrentUser`] for the handler.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = lookup_user(&state, &request)?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Require a valid access token belonging to an admin.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = lookup_user(&state, &request)?;
    if !user.is_admin {
        return Err(AppError::Forbidden(msg::ADMINS_ONLY.into()));
    }

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

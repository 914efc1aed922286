use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
};
use serde_json::Value;

use crate::auth::hash_password;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::{Json, Path};
use crate::middleware::require_admin;
use crate::models::{Account, CreateUser, UpdateUser, User, UserWithAccounts};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/create-user", post(create_user))
        .route("/admin/users", get(list_users))
        .route("/admin/users-with-accounts", get(list_users_with_accounts))
        .route("/admin/user-accounts/{user_id}", get(user_accounts))
        .route("/admin/user/{user_id}/", put(update_user).delete(delete_user))
        .layer(middleware::from_fn_with_state(state, require_admin))
}

/// Create a user from an admin-supplied payload.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<User>)> {
    let input = CreateUser::from_payload(&payload)?;
    let password_hash = hash_password(&input.password)?;

    let conn = state.db.get()?;
    let user = match queries::create_user(&conn, &input, &password_hash) {
        Ok(user) => user,
        Err(e) if e.is_constraint_violation() => {
            return Err(AppError::Conflict(msg::USER_EXISTS.into()));
        }
        Err(e) => return Err(e),
    };

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_users(&conn)?))
}

/// Non-admin users grouped with their accounts.
pub async fn list_users_with_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithAccounts>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_users_with_accounts(&conn)?))
}

/// Accounts belonging to the given user. Unknown users get an empty list.
pub async fn user_accounts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Account>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_accounts_for_user(&conn, user_id)?))
}

/// Replace a user's credentials; the full name and admin flag change only
/// when present in the payload.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<Json<User>> {
    let input = UpdateUser::from_payload(&payload)?;
    let password_hash = hash_password(&input.password)?;

    let conn = state.db.get()?;
    if queries::get_user_by_id(&conn, user_id)?.is_none() {
        return Err(AppError::BadRequest(msg::USER_NOT_FOUND.into()));
    }

    let user = queries::update_user(&conn, user_id, &input, &password_hash)?
        .ok_or_else(|| AppError::BadRequest(msg::USER_NOT_FOUND.into()))?;

    Ok(Json(user))
}

/// Delete a user and everything they own. The response carries the user as
/// it was before deletion.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>> {
    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, user_id)?
        .ok_or_else(|| AppError::Conflict(msg::USER_NOT_FOUND.into()))?;

    queries::delete_user(&conn, user_id)?;

    Ok(Json(user))
}

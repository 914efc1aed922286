use axum::{
    Router,
    extract::{Extension, State},
    middleware,
    routing::get,
};
use serde_json::{Map, Value, json};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::{CurrentUser, require_user};
use crate::models::Transaction;

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/accounts", get(my_accounts))
        .route("/transactions", get(my_transactions))
        .layer(middleware::from_fn_with_state(state, require_user));

    Router::new().route("/", get(index)).merge(protected)
}

/// Liveness greeting.
pub async fn index() -> &'static str {
    "Hello, world!"
}

/// The authenticated user's profile.
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({
        "id": user.id,
        "email": user.email,
        "full name": user.full_name,
    }))
}

/// The user's accounts as a map of account id to balance.
pub async fn my_accounts(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>> {
    let conn = state.db.get()?;
    let accounts = queries::list_accounts_for_user(&conn, user.id)?;

    let mut map = Map::new();
    for account in accounts {
        map.insert(
            account.id.to_string(),
            serde_json::to_value(account.balance)?,
        );
    }
    Ok(Json(Value::Object(map)))
}

/// The user's transactions across all their accounts.
pub async fn my_transactions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Transaction>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_transactions_for_user(&conn, user.id)?))
}

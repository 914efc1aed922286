use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{issue_access_token, verify_password};
use crate::db::{AppState, queries};
use crate::error::{AppError, ErrorResponse, Result, msg};
use crate::extractors::Json;

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Exchange email and password for an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Response> {
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(AppError::BadRequest(msg::INVALID_CREDENTIALS_LIST.into()));
    };

    let conn = state.db.get()?;
    let user = queries::get_user_by_email(&conn, &email)?;
    let valid = user
        .as_ref()
        .is_some_and(|u| verify_password(&password, &u.password_hash));
    if !valid {
        // Bad credentials respond 418, not 401.
        return Ok((
            StatusCode::IM_A_TEAPOT,
            Json(ErrorResponse {
                error: msg::INVALID_CREDENTIALS.to_string(),
            }),
        )
            .into_response());
    }

    let token = issue_access_token(&email, &state.jwt_secret)?;
    Ok(Json(json!({ "access_token": token })).into_response())
}

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use crate::db::AppState;
use crate::error::{ErrorResponse, msg};
use crate::extractors::Json;
use crate::webhook::{PaymentEvent, WebhookError, apply_event, run_with_retries};

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(process_payment))
}

/// Ingest a payment provider event.
///
/// The signature is checked exactly once per delivery; validation and the
/// ledger mutation run under the retry policy for transient database
/// failures. The body is read raw so a provider sending a broken payload
/// still gets the documented 400 body.
pub async fn process_payment(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return error(StatusCode::BAD_REQUEST, msg::INVALID_JSON),
    };

    if !state.verifier.verify(&payload) {
        tracing::warn!("Rejected webhook with invalid signature");
        return error(StatusCode::BAD_REQUEST, msg::INVALID_JSON);
    }

    let result = run_with_retries(|| {
        let event = PaymentEvent::parse(&payload)?;
        let mut conn = state.db.get()?;
        apply_event(&mut conn, &event)
    })
    .await;

    match result {
        Ok(applied) => {
            tracing::info!(
                "Processed transaction {} for account {}: balance is now {}",
                applied.transaction.id,
                applied.account.id,
                applied.account.balance
            );
            (StatusCode::OK, Json(json!({ "message": "OK" }))).into_response()
        }
        Err(WebhookError::MalformedEvent) => error(StatusCode::BAD_REQUEST, msg::INVALID_JSON),
        Err(WebhookError::DuplicateTransaction(id)) => {
            tracing::info!("Rejected replayed transaction {}", id);
            error(StatusCode::CONFLICT, msg::TRANSACTION_EXISTS)
        }
        Err(WebhookError::UnknownUser(user_id)) => {
            tracing::warn!("Rejected webhook for unknown user {}", user_id);
            error(StatusCode::CONFLICT, msg::INVALID_USER_ID)
        }
        Err(e) => {
            tracing::error!("Webhook processing failed: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, msg::SERVER_ERROR)
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

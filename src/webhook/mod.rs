//! Webhook ingestion pipeline.
//!
//! A payment event travels through four stages: the signature check, payload
//! validation, entity resolution, and the ledger mutation. The last three run
//! inside a retry loop that only repeats on transient database failures; the
//! signature is checked exactly once per delivery.

mod event;
mod ledger;
mod retry;
mod signature;

pub use event::PaymentEvent;
pub use ledger::{AppliedEvent, apply_event};
pub use retry::{MAX_ATTEMPTS, run_with_retries};
pub use signature::SignatureVerifier;

use uuid::Uuid;

use crate::error::AppError;

/// Failure modes of webhook processing after the signature check.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Payload fields missing or of the wrong shape.
    #[error("malformed event payload")]
    MalformedEvent,

    /// The transaction id has already been recorded.
    #[error("transaction {0} already exists")]
    DuplicateTransaction(Uuid),

    /// The user does not exist, or the account belongs to someone else.
    #[error("unknown user {0}")]
    UnknownUser(i64),

    /// Lock contention or pool exhaustion; worth retrying.
    #[error("transient database error: {0}")]
    Transient(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Anything else; never retried.
    #[error("webhook processing failed: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl WebhookError {
    pub fn is_transient(&self) -> bool {
        matches!(self, WebhookError::Transient(_))
    }
}

impl From<rusqlite::Error> for WebhookError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode::{DatabaseBusy, DatabaseLocked};
        match e.sqlite_error_code() {
            Some(DatabaseBusy) | Some(DatabaseLocked) => WebhookError::Transient(Box::new(e)),
            _ => WebhookError::Internal(Box::new(e)),
        }
    }
}

impl From<r2d2::Error> for WebhookError {
    fn from(e: r2d2::Error) -> Self {
        WebhookError::Transient(Box::new(e))
    }
}

impl From<AppError> for WebhookError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Database(db) => db.into(),
            AppError::Pool(pool) => pool.into(),
            other => WebhookError::Internal(Box::new(other)),
        }
    }
}

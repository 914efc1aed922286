use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A credit applied to an account by a verified payment event.
///
/// The id is the provider's transaction id; the primary key on it is what
/// makes replayed deliveries idempotent. Serializes as
/// `{id, amount, account_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Decimal,
    pub account_id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    #[serde(skip_serializing)]
    pub created_at: i64,
}

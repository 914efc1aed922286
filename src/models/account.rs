use rust_decimal::Decimal;
use serde::Serialize;

/// Money-holding account owned by a user.
///
/// The balance is kept as a [`Decimal`] and stored as text so amounts never
/// pass through floating point. Serializes as `{id, balance}`.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub balance: Decimal,
    #[serde(skip_serializing)]
    pub created_at: i64,
}

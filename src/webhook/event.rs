use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use super::WebhookError;

/// Render a payload field the way it participates in the signature: strings
/// as sent, numbers via their JSON text. Anything else has no canonical
/// form.
pub(super) fn field_text(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A payment event whose payload passed validation.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub transaction_id: Uuid,
    pub user_id: i64,
    pub account_id: i64,
    pub amount: Decimal,
}

impl PaymentEvent {
    /// Validate the payload shape and parse the business fields.
    ///
    /// Ids may be JSON integers or strings holding integers; fractional ids
    /// are malformed. The transaction id must be a UUID string. The amount
    /// may be any JSON number or a decimal string, scientific notation
    /// included.
    pub fn parse(payload: &Value) -> Result<Self, WebhookError> {
        let object = payload.as_object().ok_or(WebhookError::MalformedEvent)?;
        for key in ["account_id", "amount", "transaction_id", "user_id", "signature"] {
            if !object.contains_key(key) {
                return Err(WebhookError::MalformedEvent);
            }
        }

        let transaction_id = object
            .get("transaction_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(WebhookError::MalformedEvent)?;

        let user_id = parse_id(object.get("user_id"))?;
        let account_id = parse_id(object.get("account_id"))?;
        let amount = parse_amount(object.get("amount"))?;

        Ok(Self {
            transaction_id,
            user_id,
            account_id,
            amount,
        })
    }
}

fn parse_id(value: Option<&Value>) -> Result<i64, WebhookError> {
    match value {
        Some(Value::Number(n)) => n.as_i64().ok_or(WebhookError::MalformedEvent),
        Some(Value::String(s)) => s.parse().map_err(|_| WebhookError::MalformedEvent),
        _ => Err(WebhookError::MalformedEvent),
    }
}

fn parse_amount(value: Option<&Value>) -> Result<Decimal, WebhookError> {
    let text = match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        _ => return Err(WebhookError::MalformedEvent),
    };
    text.parse()
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| WebhookError::MalformedEvent)
}

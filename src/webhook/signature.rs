use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::event::field_text;

/// Verifies the SHA-256 signature attached to webhook payloads.
///
/// The expected value is the lowercase hex digest of the account id, amount,
/// transaction id and user id concatenated exactly as they appear in the
/// JSON, followed by the shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check the payload's signature in constant time.
    ///
    /// Fails closed: a missing signature, or any signed field that is absent
    /// or not a string or number, makes the payload invalid. Verification
    /// itself never errors.
    pub fn verify(&self, payload: &Value) -> bool {
        let Some(provided) = payload.get("signature").and_then(Value::as_str) else {
            return false;
        };
        let Some(expected) = self.expected_signature(payload) else {
            return false;
        };
        expected.as_bytes().ct_eq(provided.as_bytes()).into()
    }

    fn expected_signature(&self, payload: &Value) -> Option<String> {
        let mut hasher = Sha256::new();
        for key in ["account_id", "amount", "transaction_id", "user_id"] {
            hasher.update(field_text(payload, key)?);
        }
        hasher.update(&self.secret);
        Some(hex::encode(hasher.finalize()))
    }
}

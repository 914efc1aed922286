use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result, msg};
use crate::models::Account;

/// Special characters allowed in passwords, also listed verbatim in the
/// rejection message.
pub const PASSWORD_SPECIALS: &str = r#"!@#$%^&*()_+=-"'<>,./\|{}[]:;`~"#;

/// Registered account holder.
///
/// `password_hash` is an Argon2 PHC string and never serializes; the wire
/// shape is `{id, email, full_name, is_admin}`.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    #[serde(skip_serializing)]
    pub created_at: i64,
}

/// Basic email format check: one `@`, a local part of letters, digits and
/// `._%+-`, a dotted domain, and an alphabetic TLD of at least two letters.
///
/// Intentionally a sanity check, not RFC 5322.
pub fn email_is_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
    {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c))
    {
        return false;
    }
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Non-empty, ASCII letters and digits plus [`PASSWORD_SPECIALS`].
pub fn password_is_valid(password: &str) -> bool {
    !password.is_empty()
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c))
}

/// Words of ASCII letters separated by single whitespace characters.
pub fn full_name_is_valid(full_name: &str) -> bool {
    if full_name.is_empty() {
        return false;
    }
    let mut expect_letter = true;
    for c in full_name.chars() {
        if c.is_ascii_alphabetic() {
            expect_letter = false;
        } else if c.is_ascii_whitespace() {
            if expect_letter {
                return false;
            }
            expect_letter = true;
        } else {
            return false;
        }
    }
    !expect_letter
}

/// Permissive boolean parsing for the `is_admin` flag on user creation:
/// the lowercased string form of the value must be one of the truthy
/// spellings, anything else is false.
pub fn truthy_flag(value: &Value) -> bool {
    let text = match value {
        Value::String(s) => s.to_ascii_lowercase(),
        other => other.to_string().to_ascii_lowercase(),
    };
    matches!(text.as_str(), "true" | "1" | "yes" | "y")
}

fn require_credentials(object: &serde_json::Map<String, Value>) -> Result<(String, String)> {
    if !object.contains_key("email") || !object.contains_key("password") {
        return Err(AppError::BadRequest(msg::MISSING_CREDENTIALS.into()));
    }
    // Non-string values fall through as "" and fail the format checks.
    let email = object.get("email").and_then(Value::as_str).unwrap_or_default();
    if !email_is_valid(email) {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL.into()));
    }
    let password = object
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !password_is_valid(password) {
        return Err(AppError::BadRequest(msg::INVALID_PASSWORD.into()));
    }
    Ok((email.to_string(), password.to_string()))
}

fn optional_full_name(object: &serde_json::Map<String, Value>) -> Result<Option<String>> {
    match object.get("full_name") {
        None => Ok(None),
        Some(value) => {
            let Some(raw) = value.as_str() else {
                return Err(AppError::BadRequest(msg::INVALID_FULL_NAME.into()));
            };
            if !full_name_is_valid(raw.trim()) {
                return Err(AppError::BadRequest(msg::INVALID_FULL_NAME.into()));
            }
            Ok(Some(raw.to_string()))
        }
    }
}

/// Validated payload for `POST /admin/create-user`.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    /// Stored trimmed.
    pub full_name: Option<String>,
    pub is_admin: bool,
}

impl CreateUser {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let Some(object) = payload.as_object() else {
            return Err(AppError::BadRequest(msg::MISSING_CREDENTIALS.into()));
        };
        let (email, password) = require_credentials(object)?;
        let full_name = optional_full_name(object)?.map(|name| name.trim().to_string());
        let is_admin = object.get("is_admin").map(truthy_flag).unwrap_or(false);

        Ok(Self {
            email,
            password,
            full_name,
            is_admin,
        })
    }
}

/// Validated payload for `PUT /admin/user/{id}/`.
///
/// Email and password are always required, exactly like creation; the
/// optional fields only change when present. `is_admin` must be a real
/// boolean here, there is no permissive parsing on update.
#[derive(Debug)]
pub struct UpdateUser {
    pub email: String,
    pub password: String,
    /// Stored as sent; validated trimmed.
    pub full_name: Option<String>,
    pub is_admin: Option<bool>,
}

impl UpdateUser {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let Some(object) = payload.as_object() else {
            return Err(AppError::BadRequest(msg::MISSING_CREDENTIALS.into()));
        };
        let (email, password) = require_credentials(object)?;
        let full_name = optional_full_name(object)?;
        let is_admin = match object.get("is_admin") {
            None => None,
            Some(Value::Bool(flag)) => Some(*flag),
            Some(_) => {
                return Err(AppError::BadRequest(
                    "invalid is_admin value - it must be a boolean".into(),
                ));
            }
        };

        Ok(Self {
            email,
            password,
            full_name,
            is_admin,
        })
    }
}

/// Non-admin user with their accounts, for the admin overview listing.
#[derive(Debug, Serialize)]
pub struct UserWithAccounts {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub accounts: Vec<Account>,
}

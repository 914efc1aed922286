mod jwt;
mod password;

pub use jwt::{ACCESS_TOKEN_TTL_MINUTES, Claims, decode_access_token, issue_access_token};
pub use password::{hash_password, verify_password};

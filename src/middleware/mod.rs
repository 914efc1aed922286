mod auth;

pub use auth::{CurrentUser, require_admin, require_user};

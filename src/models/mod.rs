mod account;
mod transaction;
mod user;

pub use account::Account;
pub use transaction::Transaction;
pub use user::{
    CreateUser, PASSWORD_SPECIALS, UpdateUser, User, UserWithAccounts, email_is_valid,
    full_name_is_valid, password_is_valid, truthy_flag,
};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params, types::Value};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

use super::from_row::{ACCOUNT_COLS, TRANSACTION_COLS, USER_COLS, parse_text, query_all, query_one};

pub(crate) fn now() -> i64 {
    Utc::now().timestamp()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: i64,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: i64) -> Self {
        Self {
            table,
            id,
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Execute the update and return the updated entity using a RETURNING
    /// clause. Returns None if no rows matched.
    fn execute_returning<T: super::from_row::FromRow>(
        self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Users ============

/// Create a user. The caller supplies an already-hashed password.
pub fn create_user(conn: &Connection, input: &CreateUser, password_hash: &str) -> Result<User> {
    let now = now();

    conn.execute(
        "INSERT INTO users (email, full_name, password_hash, is_admin, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            &input.email,
            &input.full_name,
            password_hash,
            input.is_admin,
            now
        ],
    )?;

    Ok(User {
        id: conn.last_insert_rowid(),
        email: input.email.clone(),
        full_name: input.full_name.clone(),
        password_hash: password_hash.to_string(),
        is_admin: input.is_admin,
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

/// All users, ordered by the admin flag and then by id.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    query_all(
        conn,
        &format!("SELECT {} FROM users ORDER BY is_admin, id", USER_COLS),
        &[],
    )
}

/// Update a user's credentials and optional fields, returning the updated
/// row. Returns None when no user has the given id.
pub fn update_user(
    conn: &Connection,
    id: i64,
    input: &UpdateUser,
    password_hash: &str,
) -> Result<Option<User>> {
    UpdateBuilder::new("users", id)
        .set("email", input.email.clone())
        .set("password_hash", password_hash.to_string())
        .set_opt("full_name", input.full_name.clone())
        .set_opt("is_admin", input.is_admin)
        .execute_returning(conn, USER_COLS)
}

/// Delete a user; accounts and transactions go with it via cascade.
pub fn delete_user(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

/// Non-admin users with their accounts attached, for the admin overview.
pub fn list_users_with_accounts(conn: &Connection) -> Result<Vec<UserWithAccounts>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.email, u.full_name, u.is_admin,
                a.id, a.user_id, a.balance, a.created_at
         FROM users u
         LEFT JOIN accounts a ON a.user_id = u.id
         WHERE u.is_admin = 0
         ORDER BY u.id, a.id",
    )?;

    let mut users: Vec<UserWithAccounts> = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let user_id: i64 = row.get(0)?;
        if users.last().map(|u| u.id) != Some(user_id) {
            users.push(UserWithAccounts {
                id: user_id,
                email: row.get(1)?,
                full_name: row.get(2)?,
                is_admin: row.get::<_, i32>(3)? != 0,
                accounts: Vec::new(),
            });
        }
        // LEFT JOIN: account columns are NULL for users without accounts.
        if let Some(account_id) = row.get::<_, Option<i64>>(4)? {
            let account = Account {
                id: account_id,
                user_id: row.get(5)?,
                balance: parse_text(row, 6, "balance")?,
                created_at: row.get(7)?,
            };
            if let Some(user) = users.last_mut() {
                user.accounts.push(account);
            }
        }
    }
    Ok(users)
}

// ============ Accounts ============

pub fn get_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    query_one(
        conn,
        &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLS),
        &[&id],
    )
}

pub fn list_accounts_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Account>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM accounts WHERE user_id = ?1 ORDER BY id",
            ACCOUNT_COLS
        ),
        &[&user_id],
    )
}

/// Create an account with a provider-assigned id and a zero balance.
pub fn create_account(conn: &Connection, id: i64, user_id: i64) -> Result<Account> {
    let now = now();
    let balance = Decimal::ZERO;

    conn.execute(
        "INSERT INTO accounts (id, user_id, balance, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, user_id, balance.to_string(), now],
    )?;

    Ok(Account {
        id,
        user_id,
        balance,
        created_at: now,
    })
}

pub fn set_account_balance(conn: &Connection, id: i64, balance: Decimal) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET balance = ?1 WHERE id = ?2",
        params![balance.to_string(), id],
    )?;
    Ok(())
}

// ============ Transactions ============

pub fn transaction_exists(conn: &Connection, id: &Uuid) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM transactions WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Insert a transaction unless its id is already present.
/// Returns false when a row with the same id already existed.
pub fn try_insert_transaction(conn: &Connection, tx: &Transaction) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO transactions (id, amount, account_id, user_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            tx.id.to_string(),
            tx.amount.to_string(),
            tx.account_id,
            tx.user_id,
            tx.created_at
        ],
    )?;
    Ok(affected > 0)
}

pub fn get_transaction(conn: &Connection, id: &Uuid) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLS),
        &[&id.to_string()],
    )
}

pub fn list_transactions_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Transaction>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE user_id = ?1 ORDER BY created_at, id",
            TRANSACTION_COLS
        ),
        &[&user_id],
    )
}

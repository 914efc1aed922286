mod from_row;
pub mod queries;
mod schema;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::webhook::SignatureVerifier;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every router.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Checks webhook payload signatures before anything touches the ledger.
    pub verifier: SignatureVerifier,
    /// Secret for signing and verifying access tokens.
    pub jwt_secret: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // Foreign keys are off by default in SQLite and the cascade deletes
    // depend on them; the busy timeout keeps concurrent webhook writers
    // queuing instead of failing instantly.
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
    });
    Pool::builder().max_size(10).build(manager)
}

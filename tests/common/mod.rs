//! Test utilities and fixtures for Paygate integration tests

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;

// Re-export the main library crate
pub use paygate::auth::{hash_password, issue_access_token};
pub use paygate::db::{AppState, create_pool, init_db, queries};
pub use paygate::handlers;
pub use paygate::models::*;
pub use paygate::webhook::SignatureVerifier;

/// Shared secret the tests sign webhook payloads with.
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Secret the tests sign access tokens with.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState for testing, backed by a database file in a fresh
/// temporary directory.
///
/// File-backed rather than in-memory so every pooled connection sees the
/// same database, which the concurrency tests depend on. The returned
/// guard deletes the directory on drop; keep it alive for the test's
/// duration.
pub fn create_test_app_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("paygate-test.db");
    let pool = create_pool(path.to_str().expect("temp path should be UTF-8"))
        .expect("Failed to create pool");
    {
        let conn = pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize schema");
    }

    let state = AppState {
        db: pool,
        verifier: SignatureVerifier::new(TEST_WEBHOOK_SECRET),
        jwt_secret: TEST_JWT_SECRET.to_string(),
    };
    (state, dir)
}

/// Create a Router with the full application surface, as main() wires it
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::public::router(state.clone()))
        .merge(handlers::auth::router())
        .merge(handlers::webhook::router())
        .merge(handlers::admin::router(state.clone()))
        .with_state(state)
}

/// Create a test user with a hashed password
pub fn create_test_user(conn: &Connection, email: &str, password: &str, is_admin: bool) -> User {
    let input = CreateUser {
        email: email.to_string(),
        password: password.to_string(),
        full_name: None,
        is_admin,
    };
    let password_hash = hash_password(password).expect("Failed to hash test password");
    queries::create_user(conn, &input, &password_hash).expect("Failed to create test user")
}

/// Create a test account with the given provider-assigned id
pub fn create_test_account(conn: &Connection, id: i64, user_id: i64) -> Account {
    queries::create_account(conn, id, user_id).expect("Failed to create test account")
}

/// Issue an access token for a user, bypassing the login endpoint
pub fn access_token_for(email: &str) -> String {
    issue_access_token(email, TEST_JWT_SECRET).expect("Failed to issue test token")
}

/// Build a POST request with a JSON body
pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Build a GET request carrying a bearer token
pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body should be JSON")
}

//! Admin surface: user CRUD, listings, and access control

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

/// State with one admin seeded; returns the admin's bearer token too.
fn setup_admin() -> (AppState, tempfile::TempDir, String) {
    let (state, dir) = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "admin@example.com", "Hunter2", true);
    }
    (state, dir, access_token_for("admin@example.com"))
}

fn request(method: &str, uri: &str, token: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token));
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

// ============ Access Control ============

#[tokio::test]
async fn test_admin_routes_require_a_token() {
    let (state, _db_dir) = create_test_app_state();

    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/admin/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body, json!({"error": "you are unauthorized"}));
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let (state, _db_dir) = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "user@example.com", "Hunter2", false);
    }

    let token = access_token_for("user@example.com");
    let response = app(state)
        .oneshot(request("GET", "/admin/users", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body, json!({"error": "only admins allowed"}));
}

// ============ Create User ============

#[tokio::test]
async fn test_create_user_returns_the_wire_shape() {
    let (state, _db_dir, token) = setup_admin();

    let response = app(state.clone())
        .oneshot(request(
            "POST",
            "/admin/create-user",
            &token,
            Some(&json!({
                "email": "ada@example.com",
                "password": "Hunter2",
                "full_name": "Ada Lovelace",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(
        body,
        json!({
            "id": 2,
            "email": "ada@example.com",
            "full_name": "Ada Lovelace",
            "is_admin": false,
        }),
        "no password material may appear in the response"
    );

    // The created user can log in
    let login = app(state)
        .oneshot(post_json(
            "/auth/login",
            &json!({"email": "ada@example.com", "password": "Hunter2"}),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_user_accepts_truthy_admin_flags() {
    let (state, _db_dir, token) = setup_admin();

    for (i, flag) in [json!(true), json!("True"), json!("yes"), json!(1)]
        .into_iter()
        .enumerate()
    {
        let response = app(state.clone())
            .oneshot(request(
                "POST",
                "/admin/create-user",
                &token,
                Some(&json!({
                    "email": format!("admin{i}@example.com"),
                    "password": "Hunter2",
                    "is_admin": flag.clone(),
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        assert_eq!(body["is_admin"], json!(true), "flag {flag:?} should be truthy");
    }
}

#[tokio::test]
async fn test_create_user_duplicate_email_conflicts() {
    let (state, _db_dir, token) = setup_admin();

    let payload = json!({"email": "ada@example.com", "password": "Hunter2"});
    let first = app(state.clone())
        .oneshot(request("POST", "/admin/create-user", &token, Some(&payload)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app(state)
        .oneshot(request("POST", "/admin/create-user", &token, Some(&payload)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = response_json(second).await;
    assert_eq!(
        body,
        json!({"error": "user with provided credentials already exists"})
    );
}

#[tokio::test]
async fn test_create_user_validation_messages() {
    let (state, _db_dir, token) = setup_admin();

    let cases = [
        (
            json!({"password": "Hunter2"}),
            "invalid request data: missing email and/or password",
        ),
        (
            json!({"email": "not-an-email", "password": "Hunter2"}),
            "invalid email format",
        ),
        (
            json!({"email": "a@b.co", "password": "pass word"}),
            r#"invalid password value - only english letters, digits and special characters !@#$%^&*()_+=-"'<>,./\|{}[]:;`~ allowed"#,
        ),
        (
            json!({"email": "a@b.co", "password": "Hunter2", "full_name": "Ada L0velace"}),
            "invalid full_name value - it can be only list of words, consisting of ASCII characters",
        ),
    ];

    for (payload, message) in cases {
        let response = app(state.clone())
            .oneshot(request("POST", "/admin/create-user", &token, Some(&payload)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{payload}");
        let body = response_json(response).await;
        assert_eq!(body, json!({"error": message}));
    }
}

// ============ Listings ============

#[tokio::test]
async fn test_list_users_orders_admins_last() {
    let (state, _db_dir, token) = setup_admin();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "ada@example.com", "Hunter2", false);
        create_test_user(&conn, "bob@example.com", "Hunter2", false);
    }

    let response = app(state)
        .oneshot(request("GET", "/admin/users", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let emails: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(
        emails,
        ["ada@example.com", "bob@example.com", "admin@example.com"]
    );
}

#[tokio::test]
async fn test_users_with_accounts_excludes_admins() {
    let (state, _db_dir, token) = setup_admin();
    {
        let conn = state.db.get().unwrap();
        let ada = create_test_user(&conn, "ada@example.com", "Hunter2", false);
        create_test_user(&conn, "bob@example.com", "Hunter2", false);
        create_test_account(&conn, 42, ada.id);
        queries::set_account_balance(&conn, 42, "12.00".parse().unwrap()).unwrap();
    }

    let response = app(state)
        .oneshot(request("GET", "/admin/users-with-accounts", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2, "the admin itself is not listed");

    assert_eq!(users[0]["email"], json!("ada@example.com"));
    assert_eq!(
        users[0]["accounts"],
        json!([{"id": 42, "balance": "12.00"}])
    );
    assert_eq!(users[1]["email"], json!("bob@example.com"));
    assert_eq!(users[1]["accounts"], json!([]));
}

#[tokio::test]
async fn test_user_accounts_lists_one_users_accounts() {
    let (state, _db_dir, token) = setup_admin();
    {
        let conn = state.db.get().unwrap();
        let ada = create_test_user(&conn, "ada@example.com", "Hunter2", false);
        let bob = create_test_user(&conn, "bob@example.com", "Hunter2", false);
        create_test_account(&conn, 1, ada.id);
        create_test_account(&conn, 2, bob.id);
    }

    let response = app(state.clone())
        .oneshot(request("GET", "/admin/user-accounts/2", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body, json!([{"id": 1, "balance": "0"}]));

    // Unknown users simply have no accounts
    let response = app(state)
        .oneshot(request("GET", "/admin/user-accounts/999", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body, json!([]));
}

// ============ Update ============

#[tokio::test]
async fn test_update_user_replaces_credentials() {
    let (state, _db_dir, token) = setup_admin();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "ada@example.com", "Hunter2", false);
    }

    let response = app(state.clone())
        .oneshot(request(
            "PUT",
            "/admin/user/2/",
            &token,
            Some(&json!({
                "email": "countess@example.com",
                "password": "NewPass1",
                "is_admin": true,
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["email"], json!("countess@example.com"));
    assert_eq!(body["is_admin"], json!(true));

    // Old password no longer works, the new one does
    let old = app(state.clone())
        .oneshot(post_json(
            "/auth/login",
            &json!({"email": "countess@example.com", "password": "Hunter2"}),
        ))
        .await
        .unwrap();
    assert_eq!(old.status(), StatusCode::IM_A_TEAPOT);

    let new = app(state)
        .oneshot(post_json(
            "/auth/login",
            &json!({"email": "countess@example.com", "password": "NewPass1"}),
        ))
        .await
        .unwrap();
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_unknown_user_is_a_bad_request() {
    let (state, _db_dir, token) = setup_admin();

    let response = app(state)
        .oneshot(request(
            "PUT",
            "/admin/user/999/",
            &token,
            Some(&json!({"email": "a@b.co", "password": "Hunter2"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body, json!({"error": "user with given id doesn't exist"}));
}

#[tokio::test]
async fn test_update_rejects_non_boolean_admin_flag() {
    let (state, _db_dir, token) = setup_admin();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "ada@example.com", "Hunter2", false);
    }

    // Unlike creation, update takes no truthy spellings
    let response = app(state)
        .oneshot(request(
            "PUT",
            "/admin/user/2/",
            &token,
            Some(&json!({"email": "a@b.co", "password": "Hunter2", "is_admin": "yes"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============ Delete ============

#[tokio::test]
async fn test_delete_user_cascades_to_accounts_and_transactions() {
    let (state, _db_dir, token) = setup_admin();
    let tx_id = Uuid::new_v4();
    {
        let conn = state.db.get().unwrap();
        let ada = create_test_user(&conn, "ada@example.com", "Hunter2", false);
        create_test_account(&conn, 42, ada.id);
        let tx = Transaction {
            id: tx_id,
            amount: "5.00".parse::<Decimal>().unwrap(),
            account_id: 42,
            user_id: ada.id,
            created_at: chrono::Utc::now().timestamp(),
        };
        assert!(queries::try_insert_transaction(&conn, &tx).unwrap());
    }

    let response = app(state.clone())
        .oneshot(request("DELETE", "/admin/user/2/", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["email"], json!("ada@example.com"), "response carries the deleted user");

    let conn = state.db.get().unwrap();
    assert!(queries::get_user_by_id(&conn, 2).unwrap().is_none());
    assert!(queries::get_account(&conn, 42).unwrap().is_none());
    assert!(queries::get_transaction(&conn, &tx_id).unwrap().is_none());
}

#[tokio::test]
async fn test_delete_unknown_user_conflicts() {
    let (state, _db_dir, token) = setup_admin();

    let response = app(state)
        .oneshot(request("DELETE", "/admin/user/999/", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body, json!({"error": "user with given id doesn't exist"}));
}

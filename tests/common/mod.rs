//! Test utilities and fixtures for HousrCash integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

pub use housrcash::config::RateLimitConfig;
pub use housrcash::crypto::PasswordHasher;
pub use housrcash::db::{AppState, init_db, queries};
pub use housrcash::email::EmailService;
pub use housrcash::error::AppError;
pub use housrcash::handlers;
pub use housrcash::jwt::{SessionClaims, SessionSigner};
pub use housrcash::models::*;

pub const TEST_PASSWORD: &str = "hunter22";
pub const TEST_INGEST_KEY: &str = "test-ingest-key";

/// Minimal work factor; hashes still round-trip through the real format.
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(1)
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .expect("Failed to enable foreign keys");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a user with `TEST_PASSWORD`
pub fn create_test_user(conn: &Connection, email: &str, first_name: &str) -> User {
    let input = RegisterUser {
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
        first_name: first_name.to_string(),
    };
    let hash = test_hasher().hash(TEST_PASSWORD);
    queries::create_user(conn, &input, &hash).expect("Failed to create test user")
}

/// Create a user with admin rights
pub fn create_test_admin(conn: &Connection, email: &str) -> User {
    let user = create_test_user(conn, email, "Admin");
    queries::set_user_admin(conn, email, true).expect("Failed to promote test admin");
    queries::get_user_by_id(conn, user.id)
        .expect("Query failed")
        .expect("Admin not found")
}

/// Create a user holding `points`
pub fn create_test_user_with_points(conn: &Connection, email: &str, points: i64) -> User {
    let user = create_test_user(conn, email, "Saver");
    if points > 0 {
        queries::grant_points(conn, user.id, points).expect("Failed to grant points");
    }
    queries::get_user_by_id(conn, user.id)
        .expect("Query failed")
        .expect("User not found")
}

/// Create a group owned by `creator_id`
pub fn create_test_group(conn: &mut Connection, creator_id: i64, name: &str) -> GroupCreated {
    queries::create_group(conn, creator_id, &CreateGroup {
        name: name.to_string(),
    })
    .expect("Failed to create test group")
}

/// Create a group with the given members; the first user is the creator
pub fn create_test_group_with(conn: &mut Connection, members: &[&User]) -> GroupCreated {
    let (creator, rest) = members.split_first().expect("need at least one member");
    let group = create_test_group(conn, creator.id, "Flat 4B");
    for member in rest {
        queries::join_group(conn, member.id, &group.invite_code).expect("Failed to join test group");
    }
    group
}

/// Record an expense paid by `creditor_id`
pub fn create_test_expense(conn: &mut Connection, creditor_id: i64, amount_cents: i64) -> TransactionCreated {
    queries::create_group_transaction(conn, creditor_id, &CreateGroupTransaction {
        amount_cents,
        reference: Some("Groceries".to_string()),
    })
    .expect("Failed to create test expense")
}

/// Create an active, uncategorised reward
pub fn create_test_reward(conn: &Connection, title: &str, cost: i64) -> Reward {
    queries::create_reward(conn, &CreateReward {
        title: title.to_string(),
        description: Some(format!("{} description", title)),
        cost,
        image_url: None,
        is_active: true,
        category_id: None,
    })
    .expect("Failed to create test reward")
}

pub fn user_balance(conn: &Connection, user_id: i64) -> i64 {
    queries::get_user_by_id(conn, user_id)
        .expect("Query failed")
        .expect("User not found")
        .balance
}

// ============ App ============

/// AppState over a single-connection in-memory pool.
///
/// Every in-memory connection is its own database, so the pool holds exactly
/// one. Tests must drop any connection they take before sending a request.
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        signer: SessionSigner::new("test-secret-that-is-long-enough", 3600),
        password_hasher: test_hasher(),
        payment_ingest_key: Some(Arc::from(TEST_INGEST_KEY)),
        email_service: Arc::new(EmailService::disabled()),
        secure_cookies: false,
    }
}

/// The full router without rate limiting
pub fn test_app(state: &AppState) -> Router {
    handlers::app(state.clone(), RateLimitConfig::disabled())
}

/// A valid session token for `user`
pub fn token_for(state: &AppState, user: &User) -> String {
    state
        .signer
        .sign(&SessionClaims {
            user_id: user.id,
            email: user.email.clone(),
            is_admin: user.is_admin,
        })
        .expect("Failed to sign test token")
}

/// Build a request with an optional bearer token and JSON body
pub fn api_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the JSON body (Null for an empty body)
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

//! Registration, login, sessions and account endpoints

use axum::http::{Method, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_health() {
    let state = create_test_app_state();
    let app = test_app(&state);

    let (status, body) = send(&app, api_request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_sets_cookie_and_returns_token() {
    let state = create_test_app_state();
    let app = test_app(&state);

    let request = api_request(
        Method::POST,
        "/api/v0/users/register",
        None,
        Some(json!({"email": "Ada@Example.com", "password": "s3cret!", "first_name": "Ada"})),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie should be set")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("auth-token="));
    assert!(cookie.contains("HttpOnly"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["user_id"], body["data"]["id"]);

    let token = body["token"].as_str().unwrap();
    let claims = state.signer.verify(token).unwrap();
    assert_eq!(claims.email, "ada@example.com");
}

#[tokio::test]
async fn test_register_validation() {
    let state = create_test_app_state();
    let app = test_app(&state);

    let (status, body) = send(
        &app,
        api_request(
            Method::POST,
            "/api/v0/users/register",
            None,
            Some(json!({"email": "ada@example.com", "password": "pw"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing required fields");

    let (status, body) = send(
        &app,
        api_request(
            Method::POST,
            "/api/v0/users/register",
            None,
            Some(json!({"email": "not-an-email", "password": "pw", "first_name": "Ada"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email format");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "ada@example.com", "Ada");
    }
    let app = test_app(&state);

    let (status, body) = send(
        &app,
        api_request(
            Method::POST,
            "/api/v0/users/register",
            None,
            Some(json!({"email": "ADA@example.com", "password": "pw", "first_name": "Ada"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_login() {
    let state = create_test_app_state();
    let user = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "ada@example.com", "Ada")
    };
    let app = test_app(&state);

    let (status, body) = send(
        &app,
        api_request(
            Method::POST,
            "/api/v0/users/login",
            None,
            Some(json!({"email": "ada@example.com", "password": TEST_PASSWORD})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user_id"], user.id);

    let token = body["token"].as_str().unwrap();
    let (status, me) = send(&app, api_request(Method::GET, "/api/v0/users/me", Some(token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["id"], user.id);
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "ada@example.com", "Ada");
    }
    let app = test_app(&state);

    for (email, password) in [("ada@example.com", "wrong"), ("nobody@example.com", TEST_PASSWORD)] {
        let (status, body) = send(
            &app,
            api_request(
                Method::POST,
                "/api/v0/users/login",
                None,
                Some(json!({"email": email, "password": password})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", email);
        assert_eq!(body["message"], "Invalid credentials", "{}", email);
    }
}

#[tokio::test]
async fn test_cookie_session() {
    let state = create_test_app_state();
    let user = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "ada@example.com", "Ada")
    };
    let token = token_for(&state, &user);
    let app = test_app(&state);

    let request = axum::http::Request::builder()
        .uri("/api/v0/users/me")
        .header(header::COOKIE, format!("auth-token={}", token))
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let state = create_test_app_state();
    let app = test_app(&state);

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v0/users/logout")
        .header(header::COOKIE, "auth-token=stale")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("auth-token="));
    assert!(cookie.contains("Max-Age=0"), "removal cookie expires immediately: {}", cookie);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let state = create_test_app_state();
    let app = test_app(&state);

    let (status, body) = send(&app, api_request(Method::GET, "/api/v0/users/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        api_request(Method::GET, "/api/v0/users/me", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let state = create_test_app_state();
    let ghost = User {
        id: 4242,
        email: "ghost@example.com".into(),
        first_name: "Ghost".into(),
        balance: 0,
        is_admin: false,
        group_id: None,
        group_spend_cents: 0,
        group_debt_cents: 0,
        created_at: 0,
    };
    let token = token_for(&state, &ghost);
    let app = test_app(&state);

    let (status, _) = send(&app, api_request(Method::GET, "/api/v0/users/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_balance_self_or_admin() {
    let state = create_test_app_state();
    let (ada, bob, admin) = {
        let conn = state.db.get().unwrap();
        (
            create_test_user_with_points(&conn, "ada@example.com", 750),
            create_test_user(&conn, "bob@example.com", "Bob"),
            create_test_admin(&conn, "admin@example.com"),
        )
    };
    let app = test_app(&state);
    let uri = format!("/api/v0/users/{}/balance", ada.id);

    let (status, body) = send(&app, api_request(Method::GET, &uri, Some(&token_for(&state, &ada)), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"], 750);

    let (status, _) = send(&app, api_request(Method::GET, &uri, Some(&token_for(&state, &bob)), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, api_request(Method::GET, &uri, Some(&token_for(&state, &admin)), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        api_request(Method::GET, "/api/v0/users/abc/balance", Some(&token_for(&state, &ada)), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "path errors are JSON too");
    assert_eq!(body["success"], false);
}

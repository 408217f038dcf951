//! Integration tests for the HTTP surface.
//!
//! Drives the router with `oneshot` requests against in-memory repositories.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chirpy_auth::auth::{
    AuthConfig, AuthManager, PasswordConfig, PasswordHasher, User, access,
};
use chirpy_auth::db::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
use chirpy_server::api::{AppState, create_router, request_id::REQUEST_ID_HEADER};
use chirpy_server::membership::InMemoryMembershipService;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

const EMAIL: &str = "walt@breakingbad.com";
const PASSWORD: &str = "04234";
const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";
const JWT_SECRET: &str = "test_secret_key_for_testing_only_32";

struct TestServer {
    app: axum::Router,
    user: User,
    membership: InMemoryMembershipService,
}

/// Helper to create a router over one seeded user
fn create_test_server() -> TestServer {
    let config = AuthConfig {
        password: PasswordConfig::testing(),
        api_key: Some(POLKA_KEY.to_string()),
        ..AuthConfig::new(JWT_SECRET)
    };
    let hasher = PasswordHasher::new(&config.password).expect("valid test params");

    let user = User {
        id: Uuid::new_v4(),
        email: EMAIL.to_string(),
        hashed_password: hasher.hash(PASSWORD).unwrap(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let users = InMemoryUserRepository::new().with_user(user.clone());

    let auth_manager = AuthManager::new(
        config,
        Arc::new(users),
        Arc::new(InMemoryRefreshTokenRepository::new()),
    )
    .expect("Failed to build auth manager");

    let membership = InMemoryMembershipService::new();
    membership.add_user(user.id);

    let state = AppState {
        auth_manager: Arc::new(auth_manager),
        membership: Arc::new(membership.clone()),
        database: None,
        dev_mode: false,
    };

    TestServer {
        app: create_router(state),
        user,
        membership,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authorized(method: &str, uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap()
}

/// Log in and return (access token, refresh token)
async fn login(app: &axum::Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/login",
            json!({ "email": EMAIL, "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_check_without_database() {
    let server = create_test_server();

    let response = server
        .app
        .oneshot(
            Request::builder()
                .uri("/api/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_login_returns_user_and_tokens() {
    let server = create_test_server();

    let response = server
        .app
        .oneshot(json_request(
            "/api/login",
            json!({ "email": EMAIL, "password": PASSWORD, "expires_in_seconds": 600 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], server.user.id.to_string());
    assert_eq!(body["email"], EMAIL);
    assert!(body.get("hashed_password").is_none());
    assert_eq!(body["refresh_token"].as_str().unwrap().len(), 64);
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
}

#[tokio::test]
async fn test_login_out_of_range_lifetime_is_capped() {
    let server = create_test_server();

    for requested in [i64::MAX, i64::MIN, i64::MAX / 1000 + 1, -1, 0, 3600, 3601] {
        let response = server
            .app
            .clone()
            .oneshot(json_request(
                "/api/login",
                json!({ "email": EMAIL, "password": PASSWORD, "expires_in_seconds": requested }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "expires_in_seconds = {requested}");

        let body = body_json(response).await;
        let claims = access::decode_claims(body["token"].as_str().unwrap(), JWT_SECRET).unwrap();
        let lifetime_ms = claims.exp - claims.iat;
        assert!(lifetime_ms > 0);
        assert!(lifetime_ms <= 3_600_000, "expires_in_seconds = {requested}");
    }
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let server = create_test_server();

    let wrong_password = server
        .app
        .clone()
        .oneshot(json_request(
            "/api/login",
            json!({ "email": EMAIL, "password": "wrong" }),
        ))
        .await
        .unwrap();
    let unknown_user = server
        .app
        .oneshot(json_request(
            "/api/login",
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_user).await);
}

#[tokio::test]
async fn test_me_requires_access_token() {
    let server = create_test_server();
    let (access_token, _) = login(&server.app).await;

    let missing = server
        .app
        .clone()
        .oneshot(Request::builder().uri("/api/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = server
        .app
        .clone()
        .oneshot(authorized("GET", "/api/me", "Bearer not.a.jwt"))
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .app
        .oneshot(authorized(
            "GET",
            "/api/me",
            &format!("Bearer {access_token}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], server.user.id.to_string());
    assert_eq!(body["email"], EMAIL);
}

#[tokio::test]
async fn test_refresh_issues_working_access_token() {
    let server = create_test_server();
    let (_, refresh_token) = login(&server.app).await;

    let response = server
        .app
        .clone()
        .oneshot(authorized(
            "POST",
            "/api/refresh",
            &format!("Bearer {refresh_token}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    // Rotation is off by default
    assert!(body.get("refresh_token").is_none());
    let access_token = body["token"].as_str().unwrap();

    let me = server
        .app
        .oneshot(authorized(
            "GET",
            "/api/me",
            &format!("Bearer {access_token}"),
        ))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_unknown_token() {
    let server = create_test_server();

    let response = server
        .app
        .oneshot(authorized("POST", "/api/refresh", &format!("Bearer {}", "ab".repeat(32))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoke_is_idempotent_and_blocks_refresh() {
    let server = create_test_server();
    let (_, refresh_token) = login(&server.app).await;
    let authorization = format!("Bearer {refresh_token}");

    for _ in 0..2 {
        let response = server
            .app
            .clone()
            .oneshot(authorized("POST", "/api/revoke", &authorization))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = server
        .app
        .oneshot(authorized("POST", "/api/refresh", &authorization))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoke_without_credential() {
    let server = create_test_server();

    let response = server
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/revoke")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

fn webhook(authorization: Option<&str>, event: &str, user_id: Uuid) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/polka/webhooks")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder
        .body(Body::from(
            json!({ "event": event, "data": { "user_id": user_id } }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_webhook_api_key() {
    let server = create_test_server();
    let user_id = server.user.id;

    let accepted = server
        .app
        .clone()
        .oneshot(webhook(
            Some(&format!("ApiKey {POLKA_KEY}")),
            "user.upgraded",
            user_id,
        ))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::NO_CONTENT);
    assert!(server.membership.is_member(user_id));

    let wrong_key = server
        .app
        .clone()
        .oneshot(webhook(Some("ApiKey not-the-key"), "user.upgraded", user_id))
        .await
        .unwrap();
    assert_eq!(wrong_key.status(), StatusCode::UNAUTHORIZED);

    let missing = server
        .app
        .oneshot(webhook(None, "user.upgraded", user_id))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_rejected_key_grants_nothing() {
    let server = create_test_server();
    let user_id = server.user.id;

    let response = server
        .app
        .oneshot(webhook(Some("ApiKey not-the-key"), "user.upgraded", user_id))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!server.membership.is_member(user_id));
}

#[tokio::test]
async fn test_webhook_events() {
    let server = create_test_server();
    let authorization = format!("ApiKey {POLKA_KEY}");

    let ignored = server
        .app
        .clone()
        .oneshot(webhook(Some(&authorization), "user.payment_failed", server.user.id))
        .await
        .unwrap();
    assert_eq!(ignored.status(), StatusCode::NO_CONTENT);
    assert!(!server.membership.is_member(server.user.id));

    let unknown_user = server
        .app
        .oneshot(webhook(Some(&authorization), "user.upgraded", Uuid::new_v4()))
        .await
        .unwrap();
    assert_eq!(unknown_user.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_header() {
    let server = create_test_server();

    let echoed = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/healthz")
                .header(REQUEST_ID_HEADER, "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(echoed.headers()[REQUEST_ID_HEADER], "req-123");

    let generated = server
        .app
        .oneshot(
            Request::builder()
                .uri("/api/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let id = generated.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok());
}

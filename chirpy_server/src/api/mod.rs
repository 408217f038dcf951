//! HTTP API for the Chirpy authentication core.
//!
//! Handlers translate [`AuthError`] kinds into status codes and log
//! rejections; the core itself never logs or chooses responses.
//!
//! # Endpoints
//!
//! ```text
//! GET  /api/healthz          - Health check (public)
//! POST /api/login            - Login with email and password (public)
//! POST /api/refresh          - New access token from a refresh token (Bearer refresh token)
//! POST /api/revoke           - Revoke a refresh token (Bearer refresh token)
//! GET  /api/me               - Current user (Bearer access token)
//! POST /api/polka/webhooks   - Payment webhook granting membership (ApiKey)
//! ```

pub mod auth;
pub mod middleware;
pub mod request_id;
pub mod webhooks;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use chirpy_auth::{AuthError, AuthManager, db::Database};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{logging::log_security_event, membership::MembershipService};
use request_id::RequestId;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    /// Grants membership on payment webhooks
    pub membership: Arc<dyn MembershipService>,
    /// Absent when the server runs on in-memory repositories
    pub database: Option<Database>,
    /// Development platform: permissive CORS
    pub dev_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler result with a JSON error body
pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Status code for an authentication error
pub fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::InvalidTtl => StatusCode::BAD_REQUEST,
        e if e.is_unauthorized() => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log an authentication failure and turn it into a client-safe response
pub fn error_response(
    event_type: &str,
    error: AuthError,
    request_id: &RequestId,
) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&error);

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(request_id = request_id.as_str(), error = %error, "{event_type}");
    } else {
        log_security_event(event_type, None, Some(request_id.as_str()), &error.to_string());
    }

    (
        status,
        Json(ErrorResponse {
            error: error.client_message(),
        }),
    )
}

/// Create the API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use chirpy_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/healthz", get(health_check))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/revoke", post(auth::revoke))
        .route("/polka/webhooks", post(webhooks::polka));

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let router = Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware));

    let router = if state.dev_mode {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` with body `OK`, or `503 Service Unavailable` when the
/// database does not answer.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match &state.database {
        Some(db) => match db.health_check().await {
            Ok(()) => (StatusCode::OK, "OK"),
            Err(e) => {
                tracing::error!(error = %e, "Database health check failed");
                (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
            }
        },
        None => (StatusCode::OK, "OK"),
    }
}

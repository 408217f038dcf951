//! Authentication middleware for protected endpoints.
//!
//! Validates the `Authorization: Bearer <access token>` header and injects the
//! authenticated [`UserId`] into request extensions:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use chirpy_auth::auth::UserId;
//!
//! async fn protected_handler(Extension(user_id): Extension<UserId>) -> String {
//!     format!("Authenticated as user {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AppState, ErrorResponse, request_id::RequestId};
use crate::logging::log_security_event;

/// Reject the request with `401 Unauthorized` unless it carries a valid access token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.auth_manager.authenticate(request.headers()) {
        Ok(user_id) => {
            request.extensions_mut().insert(user_id);
            next.run(request).await
        }
        Err(e) => {
            let request_id = request.extensions().get::<RequestId>().cloned();
            log_security_event(
                "access_token_rejected",
                None,
                request_id.as_ref().map(RequestId::as_str),
                &e.to_string(),
            );
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: e.client_message(),
                }),
            )
                .into_response()
        }
    }
}

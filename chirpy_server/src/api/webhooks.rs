//! Payment provider webhooks, authenticated with `Authorization: ApiKey <key>`.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chirpy_auth::AuthError;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResult, AppState, ErrorResponse, error_response, request_id::RequestId};

/// Only event this service acts on; everything else is acknowledged and dropped
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub struct PolkaEvent {
    pub event: String,
    pub data: PolkaEventData,
}

#[derive(Debug, Deserialize)]
pub struct PolkaEventData {
    pub user_id: Uuid,
}

/// Apply a Polka event.
///
/// # Response
///
/// - `204 No Content`: Membership granted, or event ignored
/// - `401 Unauthorized`: Missing or wrong API key
/// - `404 Not Found`: `user.upgraded` for an unknown user
/// - `500 Internal Server Error`: Membership could not be stored; Polka retries
pub async fn polka(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    Json(payload): Json<PolkaEvent>,
) -> ApiResult<StatusCode> {
    state
        .auth_manager
        .authorize_api_key(&headers)
        .map_err(|e| error_response("webhook_rejected", e, &request_id))?;

    if payload.event != USER_UPGRADED_EVENT {
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = payload.data.user_id;
    match state.membership.upgrade(user_id).await {
        Ok(true) => {
            tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "User not found".to_string(),
            }),
        )),
        Err(e) => Err(error_response(
            "webhook_failed",
            AuthError::PersistFailed(e),
            &request_id,
        )),
    }
}

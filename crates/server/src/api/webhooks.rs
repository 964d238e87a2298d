use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use super::{extract::ValidatedJson, AppState};
use crate::error::{ApiError, ErrorCode};

const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub(crate) struct PolkaEvent {
    event: String,
    #[serde(default)]
    data: PolkaEventData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PolkaEventData {
    #[serde(default)]
    user_id: String,
}

/// Payment-provider callback. Only `user.upgraded` has an effect; every
/// other event is acknowledged and dropped.
pub(crate) async fn polka_webhook(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PolkaEvent>,
) -> Result<StatusCode, ApiError> {
    if payload.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %payload.event, "ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = Uuid::parse_str(&payload.data.user_id)
        .map_err(|_| ApiError::new(ErrorCode::ValidationFailed, "user_id must be a valid UUID"))?;

    if !state.store.upgrade_user(user_id).await? {
        return Err(ApiError::new(ErrorCode::NotFound, "user not found"));
    }

    tracing::info!(user_id = %user_id, "user upgraded to chirpy red");
    Ok(StatusCode::NO_CONTENT)
}

use axum::{extract::State, http::StatusCode, Extension, Json};
use chirpy_common::types::{User, UserWithTokens};
use serde::Deserialize;

use super::{extract::ValidatedJson, AppState};
use crate::{
    auth::{error::AuthFlow, middleware::AuthenticatedUser, password::hash_password},
    error::{ApiError, ErrorCode},
};

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialsRequest {
    email: String,
    password: String,
}

impl CredentialsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.email.trim().is_empty() {
            return Err(ApiError::new(ErrorCode::ValidationFailed, "email must not be empty"));
        }
        if self.password.is_empty() {
            return Err(ApiError::new(ErrorCode::ValidationFailed, "password must not be empty"));
        }
        Ok(())
    }
}

pub(crate) async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload.validate()?;
    let digest = hash_password(&payload.password).map_err(ApiError::internal)?;
    let user = state.store.create_user(&payload.email, &digest).await?;

    tracing::info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user.into_user())))
}

pub(crate) async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    ValidatedJson(payload): ValidatedJson<CredentialsRequest>,
) -> Result<Json<User>, ApiError> {
    payload.validate()?;
    let digest = hash_password(&payload.password).map_err(ApiError::internal)?;
    let user = state.store.update_user(caller.user_id, &payload.email, &digest).await?;
    Ok(Json(user.into_user()))
}

pub(crate) async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CredentialsRequest>,
) -> Result<Json<UserWithTokens>, ApiError> {
    let outcome = state
        .sessions
        .login(&payload.email, &payload.password)
        .await
        .map_err(|error| error.into_api_error(AuthFlow::Login))?;

    Ok(Json(UserWithTokens {
        user: outcome.user.into_user(),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

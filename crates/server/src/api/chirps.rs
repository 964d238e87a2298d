use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chirpy_common::{chirp::validate_chirp as clean_chirp_body, types::Chirp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{extract::ValidatedJson, AppState};
use crate::{
    auth::middleware::AuthenticatedUser,
    error::{ApiError, ErrorCode},
    store::ChirpOrder,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ChirpBody {
    body: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListChirpsQuery {
    author_id: Option<String>,
    sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CleanedChirp {
    cleaned_body: String,
}

fn cleaned_body(body: &str) -> Result<String, ApiError> {
    clean_chirp_body(body)
        .map_err(|error| ApiError::new(ErrorCode::ValidationFailed, error.to_string()))
}

/// Path ids that do not parse cannot name an existing chirp.
fn parse_chirp_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| chirp_not_found())
}

fn chirp_not_found() -> ApiError {
    ApiError::new(ErrorCode::NotFound, "chirp not found")
}

pub(crate) async fn create_chirp(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    ValidatedJson(payload): ValidatedJson<ChirpBody>,
) -> Result<(StatusCode, Json<Chirp>), ApiError> {
    let body = cleaned_body(&payload.body)?;
    let chirp = state.store.create_chirp(caller.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(chirp.into_chirp())))
}

pub(crate) async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<Json<Vec<Chirp>>, ApiError> {
    let author_id = match query.author_id.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
            ApiError::new(ErrorCode::ValidationFailed, "author_id must be a valid UUID")
        })?),
        None => None,
    };
    let order = ChirpOrder::from_query(query.sort.as_deref());

    let chirps = state.store.list_chirps(author_id, order).await?;
    Ok(Json(chirps.into_iter().map(|chirp| chirp.into_chirp()).collect()))
}

pub(crate) async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<String>,
) -> Result<Json<Chirp>, ApiError> {
    let chirp_id = parse_chirp_id(&chirp_id)?;
    let chirp = state.store.get_chirp(chirp_id).await?.ok_or_else(chirp_not_found)?;
    Ok(Json(chirp.into_chirp()))
}

pub(crate) async fn delete_chirp(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(chirp_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let chirp_id = parse_chirp_id(&chirp_id)?;
    let chirp = state.store.get_chirp(chirp_id).await?.ok_or_else(chirp_not_found)?;

    if chirp.user_id != caller.user_id {
        return Err(ApiError::new(ErrorCode::AuthForbidden, "only the author may delete a chirp"));
    }

    state.store.delete_chirp(chirp_id).await?;
    tracing::info!(chirp_id = %chirp_id, user_id = %caller.user_id, "chirp deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn validate_chirp(
    ValidatedJson(payload): ValidatedJson<ChirpBody>,
) -> Result<Json<CleanedChirp>, ApiError> {
    Ok(Json(CleanedChirp { cleaned_body: cleaned_body(&payload.body)? }))
}

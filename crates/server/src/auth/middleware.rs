use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use super::{
    error::{AuthError, AuthFlow},
    session::SessionService,
};

const BEARER_SCHEME: &str = "Bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

pub async fn require_bearer_auth(
    State(sessions): State<SessionService>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match sessions.authorize(request.headers()) {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::debug!(reason = %error, "bearer authorization failed");
            return error.into_api_error(AuthFlow::Authorize).into_response();
        }
    };

    request.extensions_mut().insert(AuthenticatedUser { user_id });

    next.run(request).await
}

/// Pull the bearer credential out of the `Authorization` header.
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MalformedCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    extract_bearer(value)
}

/// Split `"Bearer <token>"`.
///
/// Exactly two space-separated fields, the first literally `Bearer`. No
/// trimming and no case folding. An empty token field is rejected.
pub fn extract_bearer(value: &str) -> Result<&str, AuthError> {
    let mut fields = value.split(' ');

    match (fields.next(), fields.next(), fields.next()) {
        (Some(BEARER_SCHEME), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}

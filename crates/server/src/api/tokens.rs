// Refresh-token endpoints. The credential travels as `Authorization: Bearer`.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use super::AppState;
use crate::{
    auth::{error::AuthFlow, middleware::bearer_from_headers},
    error::ApiError,
};

#[derive(Debug, Serialize)]
pub(crate) struct RefreshResponse {
    token: String,
}

pub(crate) async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, ApiError> {
    let refresh_token =
        bearer_from_headers(&headers).map_err(|error| error.into_api_error(AuthFlow::Refresh))?;
    let token = state
        .sessions
        .refresh(refresh_token)
        .await
        .map_err(|error| error.into_api_error(AuthFlow::Refresh))?;

    Ok(Json(RefreshResponse { token }))
}

pub(crate) async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let refresh_token =
        bearer_from_headers(&headers).map_err(|error| error.into_api_error(AuthFlow::Refresh))?;
    state
        .sessions
        .revoke(refresh_token)
        .await
        .map_err(|error| error.into_api_error(AuthFlow::Refresh))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::api::test_support::{send, signup_and_login, test_router};

    #[tokio::test]
    async fn refresh_issues_a_working_access_token() {
        let (app, state) = test_router();
        let (user_id, _, refresh) = signup_and_login(&app, "hank@dea.gov", "minerals").await;

        let (status, body) = send(&app, Method::POST, "/api/refresh", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::OK);

        let token = body["token"].as_str().expect("token");
        let subject = state.sessions.codec().verify(token).expect("token should verify");
        assert_eq!(subject.to_string(), user_id);
    }

    #[tokio::test]
    async fn revoked_refresh_token_stops_working() {
        let (app, _) = test_router();
        let (_, _, refresh) = signup_and_login(&app, "marie@purple.com", "purple").await;

        let (status, body) = send(&app, Method::POST, "/api/revoke", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());

        let (status, body) = send(&app, Method::POST, "/api/refresh", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTH_REFRESH_INVALID");

        let (status, _) = send(&app, Method::POST, "/api/revoke", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn unknown_refresh_token_matches_revoked_response() {
        let (app, _) = test_router();
        let (status, body) =
            send(&app, Method::POST, "/api/refresh", Some(&"ab".repeat(32)), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "refresh token expired or does not exist");
    }

    #[tokio::test]
    async fn access_token_is_not_accepted_as_refresh_token() {
        let (app, _) = test_router();
        let (_, access, _) = signup_and_login(&app, "todd@vamonos.com", "tarantula").await;

        let (status, body) = send(&app, Method::POST, "/api/refresh", Some(&access), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTH_REFRESH_INVALID");
    }

    #[tokio::test]
    async fn missing_bearer_is_unauthorized() {
        let (app, _) = test_router();

        let (status, body) = send(&app, Method::POST, "/api/refresh", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTH_MISSING_TOKEN");

        let (status, _) = send(&app, Method::POST, "/api/revoke", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

// JSON body extractor that answers with an `ApiError` instead of axum's
// plain-text rejections.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ErrorCode};

/// Drop-in for `axum::Json<T>` on request bodies. Every rejection becomes
/// `400 VALIDATION_FAILED`; serde detail goes to the log, not the client.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "rejected request body");
                Err(ApiError::new(ErrorCode::ValidationFailed, classify_json_rejection(&rejection)))
            }
        }
    }
}

fn classify_json_rejection(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "request body does not match the expected shape",
        JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
        JsonRejection::MissingJsonContentType(_) => "expected Content-Type: application/json",
        _ => "request body could not be read",
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::api::test_support::{read_json, test_router};

    async fn post_raw(uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, serde_json::Value) {
        let (app, _) = test_router();
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let request = builder.body(Body::from(body.to_owned())).expect("request should build");
        let response = app.oneshot(request).await.expect("request should complete");
        read_json(response).await
    }

    #[tokio::test]
    async fn malformed_login_body_is_a_json_validation_error() {
        let (status, body) = post_raw("/api/login", Some("application/json"), "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["error"], "request body is not valid JSON");
    }

    #[tokio::test]
    async fn missing_field_is_a_json_validation_error() {
        let (status, body) =
            post_raw("/api/login", Some("application/json"), r#"{"email":"a"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert!(!body["error"].as_str().expect("error message").contains("password"));
    }

    #[tokio::test]
    async fn missing_content_type_is_a_json_validation_error() {
        let (status, body) =
            post_raw("/api/users", None, r#"{"email":"a@b.c","password":"x"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["error"], "expected Content-Type: application/json");
    }

    #[tokio::test]
    async fn webhook_and_chirp_validation_share_the_error_shape() {
        let (status, body) =
            post_raw("/api/polka/webhooks", Some("application/json"), r#"{"data":{}}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");

        let (status, body) =
            post_raw("/api/validate_chirp", Some("application/json"), "[]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }
}

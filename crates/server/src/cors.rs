// CORS policy for browser clients. Credentials are never allowed; callers
// authenticate with bearer headers.

use std::time::Duration;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::REQUEST_ID_HEADER;

/// Origins allowed when `CHIRPY_CORS_ORIGINS` is unset.
const DEFAULT_DEV_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:8080",
    "http://127.0.0.1:8080",
];

/// Build the layer from the configured origin list (`"*"`, a
/// comma-separated list, or `None` for development defaults).
pub fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, request_id.clone()])
        .expose_headers([request_id])
        .max_age(Duration::from_secs(3600));

    match origins {
        Some("*") => base.allow_origin(AllowOrigin::any()),
        Some(origins) => base.allow_origin(parse_origins(origins.split(','))),
        None => base.allow_origin(parse_origins(DEFAULT_DEV_ORIGINS.iter().copied())),
    }
}

fn parse_origins<'a>(origins: impl Iterator<Item = &'a str>) -> Vec<HeaderValue> {
    origins
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::cors_layer;
    use axum::{
        body::Body,
        http::{Method, Request},
        response::Response,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn preflight(origins: Option<&str>, origin: &str) -> Response {
        Router::new()
            .route("/api/chirps", get(|| async { "ok" }))
            .layer(cors_layer(origins))
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/chirps")
                    .header("origin", origin)
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("preflight should return a response")
    }

    #[tokio::test]
    async fn default_origins_allow_localhost() {
        let response = preflight(None, "http://localhost:5173").await;

        assert_eq!(
            response.headers().get("access-control-allow-origin").expect("allow-origin header"),
            "http://localhost:5173"
        );
        assert!(response.headers().get("access-control-allow-credentials").is_none());
    }

    #[tokio::test]
    async fn unknown_origin_is_not_allowed() {
        let response = preflight(None, "https://evil.example.com").await;

        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn configured_origins_replace_defaults() {
        let origins = Some("https://chirpy.example.com, https://staging.chirpy.example.com");

        let allowed = preflight(origins, "https://staging.chirpy.example.com").await;
        let localhost = preflight(origins, "http://localhost:5173").await;

        assert_eq!(
            allowed.headers().get("access-control-allow-origin").expect("allow-origin header"),
            "https://staging.chirpy.example.com"
        );
        assert!(localhost.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin() {
        let response = preflight(Some("*"), "https://anything.example.com").await;

        assert_eq!(
            response.headers().get("access-control-allow-origin").expect("allow-origin header"),
            "*"
        );
    }
}

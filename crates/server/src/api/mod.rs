pub mod admin;
pub mod chirps;
pub mod extract;
pub mod tokens;
pub mod users;
pub mod webhooks;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{
    auth::{middleware::require_bearer_auth, session::SessionService},
    error::{ApiError, ErrorCode},
    metrics::FileserverHits,
    store::{Store, StoreError},
};

/// Process-wide state handed to every handler. Nothing here is global.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub sessions: SessionService,
    pub hits: Arc<FileserverHits>,
}

pub fn router(state: AppState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.sessions.clone(), require_bearer_auth);

    Router::new()
        .route("/api/users", post(users::create_user))
        .route("/api/users", put(users::update_user).route_layer(auth_layer.clone()))
        .route("/api/login", post(users::login))
        .route("/api/refresh", post(tokens::refresh))
        .route("/api/revoke", post(tokens::revoke))
        .route("/api/chirps", get(chirps::list_chirps))
        .route("/api/chirps", post(chirps::create_chirp).route_layer(auth_layer.clone()))
        .route("/api/chirps/{chirp_id}", get(chirps::get_chirp))
        .route("/api/chirps/{chirp_id}", delete(chirps::delete_chirp).route_layer(auth_layer))
        .route("/api/validate_chirp", post(chirps::validate_chirp))
        .route("/api/polka/webhooks", post(webhooks::polka_webhook))
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/reset", post(admin::reset))
        .with_state(state)
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail => {
                ApiError::new(ErrorCode::Conflict, "email is already registered")
            }
            StoreError::UserNotFound => ApiError::new(ErrorCode::NotFound, "user not found"),
            StoreError::Database(error) => ApiError::internal(error),
        }
    }
}

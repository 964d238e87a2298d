mod api;
mod auth;
mod config;
mod cors;
mod db;
mod error;
mod metrics;
mod store;

use std::{sync::Arc, time::Instant};

use anyhow::Context;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    api::AppState,
    auth::{jwt::AccessTokenCodec, session::SessionService},
    config::{LogFormat, ServerConfig},
    db::{
        migrations::run_migrations,
        pool::{create_pg_pool, PoolConfig},
    },
    error::{
        attach_request_id_header, request_id_from_headers_or_generate, with_request_id_scope,
        ApiError, ErrorCode,
    },
    metrics::{count_fileserver_hits, FileserverHits},
    store::Store,
};

const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    init_tracing(&config);

    if config.is_dev_jwt_secret() {
        warn!("CHIRPY_JWT_SECRET is not set; using the development secret");
    }

    let codec =
        Arc::new(AccessTokenCodec::new(&config.jwt_secret).context("invalid chirpy JWT secret")?);
    let store = connect_store(&config).await?;
    let sessions = SessionService::new(
        store.clone(),
        codec,
        config.access_token_ttl,
        config.refresh_token_ttl,
    );
    let state = AppState { store, sessions, hits: Arc::new(FileserverHits::default()) };

    let app = build_router(state, &config.fileserver_root, config.cors_origins.as_deref());

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind chirpy listener on {}", config.listen_addr))?;

    info!(listen_addr = %config.listen_addr, "starting chirpy server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("chirpy server exited unexpectedly")
}

fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

async fn connect_store(config: &ServerConfig) -> anyhow::Result<Store> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("CHIRPY_DATABASE_URL is not set; using the in-memory store");
        return Ok(Store::memory());
    };

    let pool = create_pg_pool(database_url, PoolConfig::from_env()).await?;
    run_migrations(&pool).await?;
    info!("connected to postgres and applied migrations");

    Ok(Store::Postgres(pool))
}

fn build_router(state: AppState, fileserver_root: &str, cors_origins: Option<&str>) -> Router {
    let fileserver = Router::new()
        .nest_service("/app", ServeDir::new(fileserver_root))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.hits),
            count_fileserver_hits,
        ));

    apply_middleware(
        Router::new()
            .route("/api/healthz", get(healthz))
            .merge(fileserver)
            .merge(api::router(state)),
        cors_origins,
    )
}

fn apply_middleware(router: Router, cors_origins: Option<&str>) -> Router {
    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(cors::cors_layer(cors_origins))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(panic_handler))
}

async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(?error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                error!(?error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}

async fn panic_handler(request: Request<Body>, next: Next) -> Response {
    match tokio::spawn(async move { next.run(request).await }).await {
        Ok(response) => response,
        Err(join_error) => {
            error!(?join_error, "request handling panicked");
            ApiError::from_code(ErrorCode::InternalError).into_response()
        }
    }
}

async fn request_context_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = request_id_from_headers_or_generate(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();

    let mut response = with_request_id_scope(request_id.clone(), next.run(request)).await;
    attach_request_id_header(&mut response, &request_id);

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started_at.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

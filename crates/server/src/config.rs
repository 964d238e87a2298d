// Server configuration.
//
// Centralizes environment variable parsing with defaults for local
// development. Database pool sizing lives in `db::pool`.

use std::net::SocketAddr;

use chrono::Duration;
use tracing::warn;

use crate::auth::session::{DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_REFRESH_TOKEN_TTL_DAYS};

const DEV_JWT_SECRET: &str = "chirpy_local_development_jwt_secret_must_be_32_chars";

/// Upper bound for either token lifetime. Keeps `now + ttl` far inside the
/// range of a timestamp.
const MAX_TOKEN_TTL_DAYS: i64 = 100 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Core server configuration.
///
/// Constructed via [`ServerConfig::from_env`] which reads environment
/// variables and falls back to development defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (host:port).
    pub listen_addr: SocketAddr,
    /// HMAC secret for access tokens.
    pub jwt_secret: String,
    /// PostgreSQL connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Directory served under `/app`.
    pub fileserver_root: String,
    /// Comma-separated CORS origins (or `"*"` for any).
    pub cors_origins: Option<String>,
    /// Log filter directive (e.g. `info`, `chirpy_server=debug`).
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `CHIRPY_HOST` | `0.0.0.0` |
    /// | `CHIRPY_PORT` | `8080` |
    /// | `CHIRPY_JWT_SECRET` | dev-only placeholder |
    /// | `CHIRPY_DATABASE_URL` | *(none)* |
    /// | `CHIRPY_ACCESS_TOKEN_TTL_SECS` | `3600` |
    /// | `CHIRPY_REFRESH_TOKEN_TTL_DAYS` | `60` |
    /// | `CHIRPY_FILESERVER_ROOT` | `.` |
    /// | `CHIRPY_CORS_ORIGINS` | *(none)* |
    /// | `CHIRPY_LOG_FILTER` | `info` |
    /// | `CHIRPY_LOG_FORMAT` | `text` |
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    fn from_env_fn<F>(env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let non_empty = |key: &str| env(key).ok().filter(|value| !value.trim().is_empty());

        let host = non_empty("CHIRPY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 =
            non_empty("CHIRPY_PORT").and_then(|v| v.parse().ok()).unwrap_or(8080);
        let listen_addr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));

        let jwt_secret = non_empty("CHIRPY_JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.into());
        let database_url = non_empty("CHIRPY_DATABASE_URL");

        let access_token_ttl = token_lifetime(
            "CHIRPY_ACCESS_TOKEN_TTL_SECS",
            non_empty("CHIRPY_ACCESS_TOKEN_TTL_SECS"),
            Duration::try_seconds,
            Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
        );
        let refresh_token_ttl = token_lifetime(
            "CHIRPY_REFRESH_TOKEN_TTL_DAYS",
            non_empty("CHIRPY_REFRESH_TOKEN_TTL_DAYS"),
            Duration::try_days,
            Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
        );

        let fileserver_root = non_empty("CHIRPY_FILESERVER_ROOT").unwrap_or_else(|| ".".into());
        let cors_origins = non_empty("CHIRPY_CORS_ORIGINS");
        let log_filter = non_empty("CHIRPY_LOG_FILTER").unwrap_or_else(|| "info".into());
        let log_format = match non_empty("CHIRPY_LOG_FORMAT").as_deref() {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            listen_addr,
            jwt_secret,
            database_url,
            access_token_ttl,
            refresh_token_ttl,
            fileserver_root,
            cors_origins,
            log_filter,
            log_format,
        }
    }

    /// Returns true when using the development-only JWT secret.
    pub fn is_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Parse a positive lifetime. Unparseable, non-positive or out-of-range
/// values fall back to `default`.
fn token_lifetime(
    key: &str,
    raw: Option<String>,
    to_duration: fn(i64) -> Option<Duration>,
    default: Duration,
) -> Duration {
    let Some(raw) = raw else {
        return default;
    };

    match raw.parse::<i64>().ok().filter(|value| *value > 0).and_then(to_duration) {
        Some(ttl) if ttl <= Duration::days(MAX_TOKEN_TTL_DAYS) => ttl,
        _ => {
            warn!(key, value = %raw, "ignoring invalid token lifetime; using default");
            default
        }
    }
}

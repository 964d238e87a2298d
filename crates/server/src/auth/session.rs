// Login, refresh, revoke and authorize on top of the token primitives.
//
// Access tokens are verified statelessly by `AccessTokenCodec`; refresh
// tokens always go through the store. The two paths never share code.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    error::AuthError,
    jwt::AccessTokenCodec,
    middleware::bearer_from_headers,
    password::{verify_password, verify_unknown_user},
    refresh::{ensure_usable, generate_refresh_token},
};
use crate::store::{Store, UserRecord};

pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionService {
    store: Store,
    codec: Arc<AccessTokenCodec>,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl SessionService {
    pub fn new(
        store: Store,
        codec: Arc<AccessTokenCodec>,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
    ) -> Self {
        Self { store, codec, access_token_ttl, refresh_token_ttl }
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    /// Verify email and password, then mint an access/refresh pair.
    ///
    /// Unknown email and wrong password both yield
    /// [`AuthError::CredentialMismatch`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            verify_unknown_user(password)?;
            info!("login rejected: unknown email");
            return Err(AuthError::CredentialMismatch);
        };

        if !verify_password(&user.hashed_password, password)? {
            info!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::CredentialMismatch);
        }

        let access_token = self.codec.issue(user.id, self.access_token_ttl)?;
        let refresh_token = generate_refresh_token()?;
        let expires_at = Utc::now()
            .checked_add_signed(self.refresh_token_ttl)
            .ok_or(AuthError::LifetimeOverflow)?;
        self.store.create_refresh_token(&refresh_token, user.id, expires_at).await?;

        info!(user_id = %user.id, "login succeeded");
        Ok(LoginOutcome { user, access_token, refresh_token })
    }

    /// Exchange a stored refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let record =
            self.store.find_refresh_token(refresh_token).await?.ok_or(AuthError::TokenNotFound)?;

        if let Err(error) = ensure_usable(&record, Utc::now()) {
            warn!(user_id = %record.user_id, reason = %error, "refresh rejected");
            return Err(error);
        }

        self.codec.issue(record.user_id, self.access_token_ttl)
    }

    /// Revoke a refresh token. Unknown tokens are accepted silently.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.store.revoke_refresh_token(refresh_token).await?;
        info!("refresh token revoked");
        Ok(())
    }

    /// Resolve the caller of a request from its bearer access token.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = bearer_from_headers(headers)?;
        self.codec.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionService, DEFAULT_REFRESH_TOKEN_TTL_DAYS};
    use crate::{
        auth::{error::AuthError, jwt::AccessTokenCodec, password::hash_password},
        store::Store,
    };
    use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use uuid::Uuid;

    const TEST_SECRET: &str = "chirpy_test_secret_that_is_definitely_long_enough";
    const OTHER_SECRET: &str = "another_chirpy_secret_that_is_also_long_enough";

    fn service_with(store: Store, secret: &str) -> SessionService {
        SessionService::new(
            store,
            Arc::new(AccessTokenCodec::new(secret).expect("codec should initialize")),
            Duration::hours(1),
            Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
        )
    }

    async fn service_with_user(email: &str, password: &str) -> (SessionService, Store) {
        let store = Store::memory();
        let digest = hash_password(password).expect("password should hash");
        store.create_user(email, &digest).await.expect("user should be created");
        (service_with(store.clone(), TEST_SECRET), store)
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
        );
        headers
    }

    #[tokio::test]
    async fn login_issues_a_verifiable_token_pair() {
        let (service, store) = service_with_user("walt@breakingbad.com", "04234").await;

        let outcome = service.login("walt@breakingbad.com", "04234").await.expect("login");

        assert_eq!(service.codec().verify(&outcome.access_token).expect("verify"), outcome.user.id);
        assert_eq!(outcome.refresh_token.len(), 64);
        let record = store
            .find_refresh_token(&outcome.refresh_token)
            .await
            .expect("lookup")
            .expect("refresh token should be persisted");
        assert_eq!(record.user_id, outcome.user.id);
        assert!(record.revoked_at.is_none());
        assert!(record.expires_at > Utc::now() + Duration::days(59));
    }

    #[tokio::test]
    async fn login_merges_unknown_email_and_wrong_password() {
        let (service, _) = service_with_user("walt@breakingbad.com", "04234").await;

        let wrong_password = service.login("walt@breakingbad.com", "nope").await;
        let unknown_email = service.login("jesse@breakingbad.com", "04234").await;

        assert!(matches!(wrong_password, Err(AuthError::CredentialMismatch)));
        assert!(matches!(unknown_email, Err(AuthError::CredentialMismatch)));
    }

    #[tokio::test]
    async fn refresh_issues_token_for_stored_owner() {
        let (service, _) = service_with_user("walt@breakingbad.com", "04234").await;
        let outcome = service.login("walt@breakingbad.com", "04234").await.expect("login");

        let access_token = service.refresh(&outcome.refresh_token).await.expect("refresh");

        assert_eq!(service.codec().verify(&access_token).expect("verify"), outcome.user.id);
    }

    #[tokio::test]
    async fn refresh_rejects_unknown_revoked_and_expired_tokens() {
        let (service, store) = service_with_user("walt@breakingbad.com", "04234").await;
        let outcome = service.login("walt@breakingbad.com", "04234").await.expect("login");

        assert!(matches!(service.refresh(&"0".repeat(64)).await, Err(AuthError::TokenNotFound)));

        service.revoke(&outcome.refresh_token).await.expect("revoke");
        assert!(matches!(
            service.refresh(&outcome.refresh_token).await,
            Err(AuthError::TokenRevoked)
        ));

        let expired = "e".repeat(64);
        store
            .create_refresh_token(&expired, outcome.user.id, Utc::now() - Duration::seconds(1))
            .await
            .expect("token should be stored");
        assert!(matches!(service.refresh(&expired).await, Err(AuthError::RefreshTokenExpired)));
    }

    #[tokio::test]
    async fn revoke_is_idempotent_and_accepts_unknown_tokens() {
        let (service, _) = service_with_user("walt@breakingbad.com", "04234").await;
        let outcome = service.login("walt@breakingbad.com", "04234").await.expect("login");

        service.revoke(&outcome.refresh_token).await.expect("first revoke");
        service.revoke(&outcome.refresh_token).await.expect("second revoke");
        service.revoke("never-issued").await.expect("unknown revoke");
    }

    #[tokio::test]
    async fn revoking_one_session_leaves_others_active() {
        let (service, _) = service_with_user("walt@breakingbad.com", "04234").await;
        let laptop = service.login("walt@breakingbad.com", "04234").await.expect("login");
        let phone = service.login("walt@breakingbad.com", "04234").await.expect("login");

        service.revoke(&laptop.refresh_token).await.expect("revoke");

        assert!(service.refresh(&phone.refresh_token).await.is_ok());
    }

    #[test]
    fn authorize_returns_subject_of_valid_token() {
        let service = service_with(Store::memory(), TEST_SECRET);
        let user_id = Uuid::new_v4();
        let token = service.codec().issue(user_id, Duration::hours(1)).expect("issue");

        assert_eq!(service.authorize(&bearer_headers(&token)).expect("authorize"), user_id);
    }

    #[test]
    fn authorize_distinguishes_failure_kinds() {
        let service = service_with(Store::memory(), TEST_SECRET);
        let foreign = service_with(Store::memory(), OTHER_SECRET);
        let user_id = Uuid::new_v4();

        assert!(matches!(
            service.authorize(&HeaderMap::new()),
            Err(AuthError::MalformedCredential)
        ));

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(service.authorize(&basic), Err(AuthError::MalformedCredential)));

        let wrong_secret = foreign.codec().issue(user_id, Duration::hours(1)).expect("issue");
        assert!(matches!(
            service.authorize(&bearer_headers(&wrong_secret)),
            Err(AuthError::InvalidToken)
        ));

        let expired = service
            .codec()
            .issue_at(user_id, Duration::seconds(1), Utc::now().timestamp() - 10)
            .expect("issue");
        assert!(matches!(
            service.authorize(&bearer_headers(&expired)),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[tokio::test]
    async fn unrepresentable_refresh_expiry_fails_without_persisting() {
        let store = Store::memory();
        let digest = hash_password("04234").expect("password should hash");
        store.create_user("walt@breakingbad.com", &digest).await.expect("user");
        let service = SessionService::new(
            store,
            Arc::new(AccessTokenCodec::new(TEST_SECRET).expect("codec should initialize")),
            Duration::hours(1),
            Duration::days(100_000_000),
        );

        let result = service.login("walt@breakingbad.com", "04234").await;

        assert!(matches!(result, Err(AuthError::LifetimeOverflow)));
    }

    #[tokio::test]
    async fn unknown_email_still_runs_a_password_verification() {
        let (service, _) = service_with_user("walt@breakingbad.com", "04234").await;

        let started = std::time::Instant::now();
        let result = service.login("nobody@breakingbad.com", "04234").await;

        assert!(matches!(result, Err(AuthError::CredentialMismatch)));
        assert!(started.elapsed() >= std::time::Duration::from_millis(1));
    }
}

use thiserror::Error;

use crate::{
    error::{ApiError, ErrorCode},
    store::StoreError,
};

/// Internal failure kinds of the authentication core.
///
/// These never reach a response body directly; [`AuthError::into_api_error`]
/// folds them into the outward shape appropriate for the calling flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown email or wrong password")]
    CredentialMismatch,

    #[error("authorization header is missing or is not a bearer credential")]
    MalformedCredential,

    #[error("access token is malformed, unsigned or carries an invalid subject")]
    InvalidToken,

    #[error("access token expired")]
    ExpiredToken,

    #[error("refresh token has been revoked")]
    TokenRevoked,

    #[error("refresh token expired")]
    RefreshTokenExpired,

    #[error("refresh token does not exist")]
    TokenNotFound,

    #[error("password hashing failed: {0}")]
    HashingFailure(String),

    #[error("secure random source failed: {0}")]
    EntropyFailure(String),

    #[error("access token signing failed: {0}")]
    Signing(String),

    #[error("token lifetime overflows the clock")]
    LifetimeOverflow,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which public operation an [`AuthError`] escaped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Login,
    Refresh,
    Authorize,
}

impl AuthError {
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::HashingFailure(_)
                | Self::EntropyFailure(_)
                | Self::Signing(_)
                | Self::LifetimeOverflow
                | Self::Store(_)
        )
    }

    /// Map to one of the two outward shapes: unauthorized or internal.
    ///
    /// Login collapses every credential failure into one message. Refresh
    /// and revoke collapse not-found, revoked and expired. Protected
    /// endpoints name the failing step.
    pub fn into_api_error(self, flow: AuthFlow) -> ApiError {
        if self.is_internal() {
            return ApiError::internal(self);
        }

        let code = match flow {
            AuthFlow::Login => ErrorCode::AuthInvalidCredentials,
            AuthFlow::Refresh => match self {
                Self::MalformedCredential => ErrorCode::AuthMissingToken,
                _ => ErrorCode::AuthRefreshInvalid,
            },
            AuthFlow::Authorize => match self {
                Self::MalformedCredential => ErrorCode::AuthMissingToken,
                Self::ExpiredToken => ErrorCode::AuthTokenExpired,
                _ => ErrorCode::AuthInvalidToken,
            },
        };

        ApiError::from_code(code)
    }
}

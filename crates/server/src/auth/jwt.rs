use anyhow::bail;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

pub const ACCESS_TOKEN_ISSUER: &str = "chirpy";
pub const MIN_SECRET_LEN: usize = 32;

/// Algorithms accepted on verification. Checked against the token header
/// before any signature work.
const ALLOWED_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessTokenClaims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

/// Mints and verifies stateless HS256 access tokens.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AccessTokenCodec {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            bail!("jwt secret must be at least {MIN_SECRET_LEN} characters long");
        }

        // Expiry is checked by hand so that the cutoff is exact and uses the
        // same clock reading as the rest of the call.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(user_id, ttl, Utc::now().timestamp())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        ttl: Duration,
        issued_at: i64,
    ) -> Result<String, AuthError> {
        let exp = issued_at
            .checked_add(ttl.num_seconds())
            .ok_or_else(|| AuthError::Signing("access token expiry overflows".to_owned()))?;
        let claims = AccessTokenClaims {
            iss: ACCESS_TOKEN_ISSUER.to_owned(),
            sub: user_id.to_string(),
            iat: issued_at,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| AuthError::Signing(error.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub(crate) fn verify_at(&self, token: &str, now: i64) -> Result<Uuid, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            tracing::warn!(alg = ?header.alg, "rejected access token with unexpected algorithm");
            return Err(AuthError::InvalidToken);
        }

        let claims = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?
            .claims;

        if now > claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

// Opaque refresh tokens: generation and the usability predicate.

use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};

use super::error::AuthError;
use crate::store::RefreshTokenRecord;

/// Raw entropy per refresh token; hex encoding doubles the length.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a 256-bit random token, hex-encoded to 64 characters.
pub fn generate_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0_u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|error| AuthError::EntropyFailure(error.to_string()))?;
    Ok(hex::encode(bytes))
}

/// A record is honoured only while unrevoked and not past `expires_at`.
pub fn ensure_usable(record: &RefreshTokenRecord, now: DateTime<Utc>) -> Result<(), AuthError> {
    if record.revoked_at.is_some() {
        return Err(AuthError::TokenRevoked);
    }
    if now > record.expires_at {
        return Err(AuthError::RefreshTokenExpired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ensure_usable, generate_refresh_token, REFRESH_TOKEN_BYTES};
    use crate::{auth::error::AuthError, store::RefreshTokenRecord};
    use chrono::{Duration, Utc};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn record(expires_in: Duration) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            token: generate_refresh_token().expect("token should generate"),
            user_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            expires_at: now + expires_in,
            revoked_at: None,
        }
    }

    #[test]
    fn tokens_are_64_hex_characters() {
        let token = generate_refresh_token().expect("token should generate");

        assert_eq!(token.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(token.chars().all(|char| char.is_ascii_hexdigit()));
        assert_eq!(hex::decode(&token).expect("token should be hex").len(), REFRESH_TOKEN_BYTES);
    }

    #[test]
    fn tokens_do_not_collide() {
        let tokens: HashSet<String> = (0..256)
            .map(|_| generate_refresh_token().expect("token should generate"))
            .collect();

        assert_eq!(tokens.len(), 256);
    }

    #[test]
    fn active_record_is_usable() {
        assert!(ensure_usable(&record(Duration::days(60)), Utc::now()).is_ok());
    }

    #[test]
    fn revoked_record_is_not_usable() {
        let mut record = record(Duration::days(60));
        record.revoked_at = Some(Utc::now());

        assert!(matches!(ensure_usable(&record, Utc::now()), Err(AuthError::TokenRevoked)));
    }

    #[test]
    fn expired_record_is_not_usable() {
        let record = record(Duration::seconds(10));

        assert!(ensure_usable(&record, record.expires_at).is_ok());
        assert!(matches!(
            ensure_usable(&record, record.expires_at + Duration::seconds(1)),
            Err(AuthError::RefreshTokenExpired)
        ));
    }
}

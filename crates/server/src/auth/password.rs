// One-way salted password digests (Argon2id, PHC string encoding).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::error::AuthError;

/// Well-formed digest with the default Argon2id parameters that matches no
/// password. Verifying against it costs the same as a real verification.
const UNKNOWN_USER_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$20X0fMQKy0P0dxnfeqp4dQ$+nvN1fRm2PWEphvEcg6F5ET2I3NvhY2tU8j7obY5neU";

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| AuthError::HashingFailure(error.to_string()))
}

/// Check `password` against a stored digest.
///
/// Returns `Ok(false)` on mismatch. A digest that cannot be parsed is an
/// internal failure, not a mismatch.
pub fn verify_password(digest: &str, password: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(digest).map_err(|error| AuthError::HashingFailure(error.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(error) => Err(AuthError::HashingFailure(error.to_string())),
    }
}

/// Spend one full verification for a login whose email is unknown, so the
/// two rejection paths take comparable time.
pub fn verify_unknown_user(password: &str) -> Result<(), AuthError> {
    verify_password(UNKNOWN_USER_DIGEST, password).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password, verify_unknown_user, UNKNOWN_USER_DIGEST};
    use argon2::{password_hash::PasswordHash, Algorithm, Params};
    use crate::auth::error::AuthError;

    #[test]
    fn verifies_matching_password() {
        let digest = hash_password("Hello World").expect("password should hash");

        assert!(digest.starts_with("$argon2id$"));
        assert!(verify_password(&digest, "Hello World").expect("digest should parse"));
    }

    #[test]
    fn reports_mismatch_for_different_password() {
        let digest = hash_password("04234").expect("password should hash");

        assert!(!verify_password(&digest, "04235").expect("digest should parse"));
        assert!(!verify_password(&digest, "").expect("digest should parse"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("password").expect("password should hash");
        let second = hash_password("password").expect("password should hash");

        assert_ne!(first, second);
        assert!(verify_password(&first, "password").expect("digest should parse"));
        assert!(verify_password(&second, "password").expect("digest should parse"));
    }

    #[test]
    fn corrupt_digest_is_an_internal_failure() {
        let error = verify_password("not-a-phc-string", "password")
            .expect_err("corrupt digest should not verify");

        assert!(matches!(error, AuthError::HashingFailure(_)));
    }

    #[test]
    fn unknown_user_digest_uses_default_cost_and_matches_nothing() {
        let parsed = PasswordHash::new(UNKNOWN_USER_DIGEST).expect("digest should parse");
        let params = Params::try_from(&parsed).expect("params should parse");
        let defaults = Params::default();

        assert_eq!(parsed.algorithm, Algorithm::Argon2id.ident());
        assert_eq!(params.m_cost(), defaults.m_cost());
        assert_eq!(params.t_cost(), defaults.t_cost());
        assert_eq!(params.p_cost(), defaults.p_cost());
        assert!(!verify_password(UNKNOWN_USER_DIGEST, "").expect("verification should run"));
        verify_unknown_user("hunter2").expect("dummy verification should not fail");
    }
}

// Wire types returned by the Chirpy HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a user account. Never carries the password digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    /// Set once the payment provider reports an upgrade.
    pub is_chirpy_red: bool,
}

/// Successful login payload: the public user plus a fresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserWithTokens {
    #[serde(flatten)]
    pub user: User,
    /// Signed access token (short-lived).
    pub token: String,
    /// Opaque refresh token (long-lived, store-backed).
    pub refresh_token: String,
}

/// A short text post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

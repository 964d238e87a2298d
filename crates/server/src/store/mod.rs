// Persistence for users, chirps and refresh tokens.
//
// `Store::Postgres` is used whenever a database URL is configured;
// `Store::Memory` backs local development and the test suite.

mod memory;
mod postgres;

use std::sync::Arc;

use chirpy_common::types::{Chirp, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("user does not exist")]
    UserNotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub enum Store {
    Postgres(PgPool),
    Memory(Arc<RwLock<MemoryStore>>),
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
}

impl UserRecord {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            email: self.email,
            is_chirpy_red: self.is_chirpy_red,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChirpRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

impl ChirpRecord {
    pub fn into_chirp(self) -> Chirp {
        Chirp {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            body: self.body,
            user_id: self.user_id,
        }
    }
}

/// Stored state of an opaque refresh token. Only `revoked_at` ever changes.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChirpOrder {
    #[default]
    Ascending,
    Descending,
}

impl ChirpOrder {
    /// `desc` in any case selects descending; everything else is ascending.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(value) if value.eq_ignore_ascii_case("desc") => Self::Descending,
            _ => Self::Ascending,
        }
    }
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(Arc::default())
    }

    pub async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StoreError> {
        match self {
            Self::Postgres(pool) => postgres::create_user(pool, email, hashed_password).await,
            Self::Memory(store) => memory::create_user(store, email, hashed_password).await,
        }
    }

    pub async fn update_user(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StoreError> {
        match self {
            Self::Postgres(pool) => {
                postgres::update_user(pool, user_id, email, hashed_password).await
            }
            Self::Memory(store) => memory::update_user(store, user_id, email, hashed_password).await,
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        match self {
            Self::Postgres(pool) => postgres::find_user_by_email(pool, email).await,
            Self::Memory(store) => Ok(memory::find_user_by_email(store, email).await),
        }
    }

    /// Mark a user as upgraded. Returns `false` when the user does not exist.
    pub async fn upgrade_user(&self, user_id: Uuid) -> Result<bool, StoreError> {
        match self {
            Self::Postgres(pool) => postgres::upgrade_user(pool, user_id).await,
            Self::Memory(store) => Ok(memory::upgrade_user(store, user_id).await),
        }
    }

    pub async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, StoreError> {
        match self {
            Self::Postgres(pool) => postgres::create_chirp(pool, user_id, body).await,
            Self::Memory(store) => Ok(memory::create_chirp(store, user_id, body).await),
        }
    }

    pub async fn list_chirps(
        &self,
        author_id: Option<Uuid>,
        order: ChirpOrder,
    ) -> Result<Vec<ChirpRecord>, StoreError> {
        match self {
            Self::Postgres(pool) => postgres::list_chirps(pool, author_id, order).await,
            Self::Memory(store) => Ok(memory::list_chirps(store, author_id, order).await),
        }
    }

    pub async fn get_chirp(&self, chirp_id: Uuid) -> Result<Option<ChirpRecord>, StoreError> {
        match self {
            Self::Postgres(pool) => postgres::get_chirp(pool, chirp_id).await,
            Self::Memory(store) => Ok(memory::get_chirp(store, chirp_id).await),
        }
    }

    pub async fn delete_chirp(&self, chirp_id: Uuid) -> Result<(), StoreError> {
        match self {
            Self::Postgres(pool) => postgres::delete_chirp(pool, chirp_id).await,
            Self::Memory(store) => {
                memory::delete_chirp(store, chirp_id).await;
                Ok(())
            }
        }
    }

    pub async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, StoreError> {
        match self {
            Self::Postgres(pool) => {
                postgres::create_refresh_token(pool, token, user_id, expires_at).await
            }
            Self::Memory(store) => {
                Ok(memory::create_refresh_token(store, token, user_id, expires_at).await)
            }
        }
    }

    pub async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        match self {
            Self::Postgres(pool) => postgres::find_refresh_token(pool, token).await,
            Self::Memory(store) => Ok(memory::find_refresh_token(store, token).await),
        }
    }

    /// Idempotent: unknown or already-revoked tokens are left as they are.
    pub async fn revoke_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        match self {
            Self::Postgres(pool) => postgres::revoke_refresh_token(pool, token).await,
            Self::Memory(store) => {
                memory::revoke_refresh_token(store, token).await;
                Ok(())
            }
        }
    }
}

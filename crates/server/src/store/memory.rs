use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChirpOrder, ChirpRecord, RefreshTokenRecord, StoreError, UserRecord};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: HashMap<Uuid, UserRecord>,
    /// Insertion order doubles as the tie-breaker for equal timestamps.
    chirps: Vec<ChirpRecord>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

impl MemoryStore {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users.values().any(|user| user.email == email && Some(user.id) != except)
    }
}

pub(super) async fn create_user(
    store: &Arc<RwLock<MemoryStore>>,
    email: &str,
    hashed_password: &str,
) -> Result<UserRecord, StoreError> {
    let mut state = store.write().await;
    if state.email_taken(email, None) {
        return Err(StoreError::DuplicateEmail);
    }

    let now = Utc::now();
    let user = UserRecord {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        email: email.to_owned(),
        hashed_password: hashed_password.to_owned(),
        is_chirpy_red: false,
    };
    state.users.insert(user.id, user.clone());

    Ok(user)
}

pub(super) async fn update_user(
    store: &Arc<RwLock<MemoryStore>>,
    user_id: Uuid,
    email: &str,
    hashed_password: &str,
) -> Result<UserRecord, StoreError> {
    let mut state = store.write().await;
    if state.email_taken(email, Some(user_id)) {
        return Err(StoreError::DuplicateEmail);
    }

    let user = state.users.get_mut(&user_id).ok_or(StoreError::UserNotFound)?;
    user.email = email.to_owned();
    user.hashed_password = hashed_password.to_owned();
    user.updated_at = Utc::now();

    Ok(user.clone())
}

pub(super) async fn find_user_by_email(
    store: &Arc<RwLock<MemoryStore>>,
    email: &str,
) -> Option<UserRecord> {
    store.read().await.users.values().find(|user| user.email == email).cloned()
}

pub(super) async fn upgrade_user(store: &Arc<RwLock<MemoryStore>>, user_id: Uuid) -> bool {
    let mut state = store.write().await;
    match state.users.get_mut(&user_id) {
        Some(user) => {
            user.is_chirpy_red = true;
            user.updated_at = Utc::now();
            true
        }
        None => false,
    }
}

pub(super) async fn create_chirp(
    store: &Arc<RwLock<MemoryStore>>,
    user_id: Uuid,
    body: &str,
) -> ChirpRecord {
    let now = Utc::now();
    let chirp = ChirpRecord {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        body: body.to_owned(),
        user_id,
    };
    store.write().await.chirps.push(chirp.clone());
    chirp
}

pub(super) async fn list_chirps(
    store: &Arc<RwLock<MemoryStore>>,
    author_id: Option<Uuid>,
    order: ChirpOrder,
) -> Vec<ChirpRecord> {
    let state = store.read().await;
    let mut chirps: Vec<ChirpRecord> = state
        .chirps
        .iter()
        .filter(|chirp| author_id.is_none_or(|author_id| chirp.user_id == author_id))
        .cloned()
        .collect();

    chirps.sort_by_key(|chirp| chirp.created_at);
    if order == ChirpOrder::Descending {
        chirps.reverse();
    }
    chirps
}

pub(super) async fn get_chirp(
    store: &Arc<RwLock<MemoryStore>>,
    chirp_id: Uuid,
) -> Option<ChirpRecord> {
    store.read().await.chirps.iter().find(|chirp| chirp.id == chirp_id).cloned()
}

pub(super) async fn delete_chirp(store: &Arc<RwLock<MemoryStore>>, chirp_id: Uuid) {
    store.write().await.chirps.retain(|chirp| chirp.id != chirp_id);
}

pub(super) async fn create_refresh_token(
    store: &Arc<RwLock<MemoryStore>>,
    token: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> RefreshTokenRecord {
    let now = Utc::now();
    let record = RefreshTokenRecord {
        token: token.to_owned(),
        user_id,
        created_at: now,
        updated_at: now,
        expires_at,
        revoked_at: None,
    };
    store.write().await.refresh_tokens.insert(record.token.clone(), record.clone());
    record
}

pub(super) async fn find_refresh_token(
    store: &Arc<RwLock<MemoryStore>>,
    token: &str,
) -> Option<RefreshTokenRecord> {
    store.read().await.refresh_tokens.get(token).cloned()
}

pub(super) async fn revoke_refresh_token(store: &Arc<RwLock<MemoryStore>>, token: &str) {
    let mut state = store.write().await;
    if let Some(record) = state.refresh_tokens.get_mut(token) {
        if record.revoked_at.is_none() {
            let now = Utc::now();
            record.revoked_at = Some(now);
            record.updated_at = now;
        }
    }
}

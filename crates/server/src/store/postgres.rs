use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ChirpOrder, ChirpRecord, RefreshTokenRecord, StoreError, UserRecord};

const UNIQUE_VIOLATION: &str = "23505";
const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
    hashed_password: String,
    is_chirpy_red: bool,
}

impl From<UserRow> for UserRecord {
    fn from(value: UserRow) -> Self {
        Self {
            id: value.id,
            created_at: value.created_at,
            updated_at: value.updated_at,
            email: value.email,
            hashed_password: value.hashed_password,
            is_chirpy_red: value.is_chirpy_red,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChirpRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    body: String,
    user_id: Uuid,
}

impl From<ChirpRow> for ChirpRecord {
    fn from(value: ChirpRow) -> Self {
        Self {
            id: value.id,
            created_at: value.created_at,
            updated_at: value.updated_at,
            body: value.body,
            user_id: value.user_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<RefreshTokenRow> for RefreshTokenRecord {
    fn from(value: RefreshTokenRow) -> Self {
        Self {
            token: value.token,
            user_id: value.user_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
            expires_at: value.expires_at,
            revoked_at: value.revoked_at,
        }
    }
}

pub(super) async fn create_user(
    pool: &PgPool,
    email: &str,
    hashed_password: &str,
) -> Result<UserRecord, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, created_at, updated_at, email, hashed_password)
        VALUES (gen_random_uuid(), now(), now(), $1, $2)
        RETURNING id, created_at, updated_at, email, hashed_password, is_chirpy_red
        "#,
    )
    .bind(email)
    .bind(hashed_password)
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.into())
}

pub(super) async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    email: &str,
    hashed_password: &str,
) -> Result<UserRecord, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET email = $2, hashed_password = $3, updated_at = now()
        WHERE id = $1
        RETURNING id, created_at, updated_at, email, hashed_password, is_chirpy_red
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(hashed_password)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;

    row.map(UserRecord::from).ok_or(StoreError::UserNotFound)
}

pub(super) async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, created_at, updated_at, email, hashed_password, is_chirpy_red
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(UserRecord::from))
}

pub(super) async fn upgrade_user(pool: &PgPool, user_id: Uuid) -> Result<bool, StoreError> {
    let result =
        sqlx::query("UPDATE users SET is_chirpy_red = true, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

pub(super) async fn create_chirp(
    pool: &PgPool,
    user_id: Uuid,
    body: &str,
) -> Result<ChirpRecord, StoreError> {
    let row = sqlx::query_as::<_, ChirpRow>(
        r#"
        INSERT INTO chirps (id, created_at, updated_at, body, user_id)
        VALUES (gen_random_uuid(), now(), now(), $1, $2)
        RETURNING id, created_at, updated_at, body, user_id
        "#,
    )
    .bind(body)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.into())
}

pub(super) async fn list_chirps(
    pool: &PgPool,
    author_id: Option<Uuid>,
    order: ChirpOrder,
) -> Result<Vec<ChirpRecord>, StoreError> {
    let query = match order {
        ChirpOrder::Ascending => {
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM chirps
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at ASC
            "#
        }
        ChirpOrder::Descending => {
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM chirps
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at DESC
            "#
        }
    };

    let rows = sqlx::query_as::<_, ChirpRow>(query).bind(author_id).fetch_all(pool).await?;

    Ok(rows.into_iter().map(ChirpRecord::from).collect())
}

pub(super) async fn get_chirp(
    pool: &PgPool,
    chirp_id: Uuid,
) -> Result<Option<ChirpRecord>, StoreError> {
    let row = sqlx::query_as::<_, ChirpRow>(
        "SELECT id, created_at, updated_at, body, user_id FROM chirps WHERE id = $1",
    )
    .bind(chirp_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ChirpRecord::from))
}

pub(super) async fn delete_chirp(pool: &PgPool, chirp_id: Uuid) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM chirps WHERE id = $1").bind(chirp_id).execute(pool).await?;
    Ok(())
}

pub(super) async fn create_refresh_token(
    pool: &PgPool,
    token: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<RefreshTokenRecord, StoreError> {
    let row = sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at, revoked_at)
        VALUES ($1, now(), now(), $2, $3, NULL)
        RETURNING token, user_id, created_at, updated_at, expires_at, revoked_at
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.into())
}

pub(super) async fn find_refresh_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<RefreshTokenRecord>, StoreError> {
    let row = sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
        FROM refresh_tokens
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(RefreshTokenRecord::from))
}

pub(super) async fn revoke_refresh_token(pool: &PgPool, token: &str) -> Result<(), StoreError> {
    // Single statement: a concurrent lookup sees the row before or after,
    // never in between. The first revocation time is kept.
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = COALESCE(revoked_at, now()), updated_at = now()
        WHERE token = $1
        "#,
    )
    .bind(token)
    .execute(pool)
    .await?;

    Ok(())
}

fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some(UNIQUE_VIOLATION)
                if database_error.constraint() == Some(USERS_EMAIL_CONSTRAINT) =>
            {
                return StoreError::DuplicateEmail;
            }
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::UserNotFound,
            _ => {}
        }
    }

    StoreError::Database(error)
}

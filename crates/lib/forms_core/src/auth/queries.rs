//! Auth-related database queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::AuthError;
use super::store::CredentialStore;
use crate::models::auth::CredentialRecord;

type CredentialRow = (
    i64,
    String,
    String,
    String,
    Option<String>,
    String,
    bool,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
);

/// Fetch a non-deleted user's credential record by email.
pub async fn find_credentials_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<CredentialRecord>, AuthError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, email, first_name, last_name, username, password, is_sys_admin, \
                last_login, deleted_at \
         FROM users WHERE email = $1 AND deleted_at IS NULL",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(
        |(id, email, first_name, last_name, username, password_hash, is_admin, last_login, deleted_at)| {
            CredentialRecord {
                id,
                email,
                first_name,
                last_name,
                username,
                password_hash,
                is_admin,
                last_login,
                deleted_at,
            }
        },
    ))
}

/// Stamp a user's last-login time.
pub async fn update_last_login(
    pool: &PgPool,
    user_id: i64,
    at: DateTime<Utc>,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Postgres-backed store for users and their credentials.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_active_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        find_credentials_by_email(&self.pool, email).await
    }

    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AuthError> {
        update_last_login(&self.pool, user_id, at).await
    }
}

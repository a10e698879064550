//! User database queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{UserError, UserRepository};
use crate::auth::queries::PgStore;
use crate::models::role::Role;
use crate::models::user::{DepartmentRole, NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, first_name, last_name, username, email, is_sys_admin, \
                            last_login, created_at, updated_at";

type UserRow = (
    i64,
    String,
    String,
    Option<String>,
    String,
    bool,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn to_user(row: UserRow) -> User {
    let (id, first_name, last_name, username, email, is_admin, last_login, created_at, updated_at) =
        row;
    User {
        id,
        first_name,
        last_name,
        username,
        email,
        is_admin,
        last_login,
        created_at,
        updated_at,
    }
}

/// A UNIQUE violation on write means another request took the email first.
fn email_conflict(e: sqlx::Error) -> UserError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            UserError::Validation("Email already registered".into())
        }
        _ => UserError::Db(e),
    }
}

/// Page through active users, ordered by id.
pub async fn list_users(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<User>, UserError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
         ORDER BY id OFFSET $1 LIMIT $2"
    ))
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(to_user).collect())
}

/// All active admin users.
pub async fn list_admin_users(pool: &PgPool) -> Result<Vec<User>, UserError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL AND is_sys_admin \
         ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(to_user).collect())
}

/// Fetch an active user by id.
pub async fn get_user(pool: &PgPool, id: i64) -> Result<Option<User>, UserError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(to_user))
}

/// Id of the row holding `email`, including soft-deleted rows.
pub async fn find_user_id_by_email(pool: &PgPool, email: &str) -> Result<Option<i64>, UserError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// Insert a user, returning the stored row.
pub async fn insert_user(pool: &PgPool, user: NewUser) -> Result<User, UserError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (first_name, last_name, username, email, password, is_sys_admin) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
    ))
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.is_admin)
    .fetch_one(pool)
    .await
    .map_err(email_conflict)?;
    Ok(to_user(row))
}

/// Apply the non-`None` fields of `changes` and bump `updated_at`.
pub async fn update_user(
    pool: &PgPool,
    id: i64,
    changes: UserChanges,
) -> Result<Option<User>, UserError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET \
            first_name   = COALESCE($2, first_name), \
            last_name    = COALESCE($3, last_name), \
            username     = COALESCE($4, username), \
            email        = COALESCE($5, email), \
            password     = COALESCE($6, password), \
            is_sys_admin = COALESCE($7, is_sys_admin), \
            updated_at   = now() \
         WHERE id = $1 AND deleted_at IS NULL \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(changes.first_name)
    .bind(changes.last_name)
    .bind(changes.username)
    .bind(changes.email)
    .bind(changes.password_hash)
    .bind(changes.is_admin)
    .fetch_optional(pool)
    .await
    .map_err(email_conflict)?;
    Ok(row.map(to_user))
}

/// Set `deleted_at` on an active user.
pub async fn soft_delete_user(pool: &PgPool, id: i64) -> Result<bool, UserError> {
    let result = sqlx::query(
        "UPDATE users SET deleted_at = now(), updated_at = now() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Department/role assignments of a user, skipping deleted departments.
pub async fn list_departments_roles(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<DepartmentRole>, UserError> {
    let rows = sqlx::query_as::<_, (i64, String, String, i64, Option<String>)>(
        "SELECT d.id, d.name, d.code, dur.role_id, r.name \
         FROM departments_users_roles dur \
         JOIN departments d ON d.id = dur.department_id \
         LEFT JOIN roles r ON r.id = dur.role_id \
         WHERE dur.user_id = $1 AND d.deleted_at IS NULL \
         ORDER BY d.id, dur.role_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(
            |(department_id, department_name, department_code, role_id, role_name)| DepartmentRole {
                department_id,
                department_name,
                department_code,
                role_id,
                role_name: role_name.unwrap_or_else(|| Role::name_of(role_id).to_string()),
            },
        )
        .collect())
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>, UserError> {
        list_users(self.pool(), skip, limit).await
    }

    async fn list_admins(&self) -> Result<Vec<User>, UserError> {
        list_admin_users(self.pool()).await
    }

    async fn get(&self, id: i64) -> Result<Option<User>, UserError> {
        get_user(self.pool(), id).await
    }

    async fn find_id_by_email(&self, email: &str) -> Result<Option<i64>, UserError> {
        find_user_id_by_email(self.pool(), email).await
    }

    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        insert_user(self.pool(), user).await
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, UserError> {
        update_user(self.pool(), id, changes).await
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, UserError> {
        soft_delete_user(self.pool(), id).await
    }

    async fn departments_roles(&self, user_id: i64) -> Result<Vec<DepartmentRole>, UserError> {
        list_departments_roles(self.pool(), user_id).await
    }
}

//! User management: repository seam and the create/update flows that hash
//! passwords before anything is stored.

pub mod queries;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthError;
use crate::auth::password::hash_password;
use crate::models::user::{DepartmentRole, NewUser, User, UserChanges};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Largest page `list` will return.
pub const MAX_PAGE_SIZE: i64 = 100;

/// User management errors.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for UserError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Db(e) => UserError::Db(e),
            AuthError::Validation(msg) => UserError::Validation(msg),
            other => UserError::Internal(other.to_string()),
        }
    }
}

/// Storage for user rows. Reads never return soft-deleted users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>, UserError>;

    async fn list_admins(&self) -> Result<Vec<User>, UserError>;

    async fn get(&self, id: i64) -> Result<Option<User>, UserError>;

    /// Id of the row holding `email`, deleted or not (emails stay unique).
    async fn find_id_by_email(&self, email: &str) -> Result<Option<i64>, UserError>;

    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Returns `None` when the user does not exist.
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, UserError>;

    /// Marks the user deleted. Returns `false` when there was nothing to delete.
    async fn soft_delete(&self, id: i64) -> Result<bool, UserError>;

    async fn departments_roles(&self, user_id: i64) -> Result<Vec<DepartmentRole>, UserError>;
}

/// Plain-text input for a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// Plain-text partial update.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

fn validate_email(email: &str) -> Result<(), UserError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(UserError::Validation(format!("Invalid email: {email}"))),
    }
}

fn validate_password(password: &str) -> Result<(), UserError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

async fn hash_off_thread(password: String) -> Result<String, UserError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| UserError::Internal(format!("password hash task: {e}")))?
        .map_err(UserError::from)
}

/// Clamp paging parameters to `0..` and `1..=MAX_PAGE_SIZE`.
pub fn page_bounds(skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let skip = skip.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (skip, limit)
}

/// Validate, hash the password and store a new user.
pub async fn create_user(repo: &dyn UserRepository, input: CreateUser) -> Result<User, UserError> {
    validate_email(&input.email)?;
    validate_password(&input.password)?;
    if repo.find_id_by_email(&input.email).await?.is_some() {
        return Err(UserError::Validation("Email already registered".into()));
    }

    let password_hash = hash_off_thread(input.password).await?;
    repo.create(NewUser {
        first_name: input.first_name,
        last_name: input.last_name,
        username: input.username,
        email: input.email,
        password_hash,
        is_admin: input.is_admin,
    })
    .await
}

/// Validate and apply a partial update. `None` when the user does not exist.
pub async fn update_user(
    repo: &dyn UserRepository,
    id: i64,
    input: UpdateUser,
) -> Result<Option<User>, UserError> {
    if let Some(email) = &input.email {
        validate_email(email)?;
        if let Some(owner) = repo.find_id_by_email(email).await?
            && owner != id
        {
            return Err(UserError::Validation("Email already registered".into()));
        }
    }
    let password_hash = match input.password {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_off_thread(password).await?)
        }
        None => None,
    };

    repo.update(
        id,
        UserChanges {
            first_name: input.first_name,
            last_name: input.last_name,
            username: input.username,
            email: input.email,
            password_hash,
            is_admin: input.is_admin,
        },
    )
    .await
}

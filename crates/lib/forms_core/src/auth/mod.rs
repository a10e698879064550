//! Authentication and authorization logic.
//!
//! Provides password hashing, the token codec, credential checks and the
//! bearer-token access policies shared by `forms_api` handlers.

pub mod authenticator;
pub mod authorize;
pub mod jwt;
pub mod password;
pub mod queries;
pub mod refresh;
pub mod store;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user and wrong password are deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

//! Application error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use forms_core::auth::AuthError;
use forms_core::auth::authorize::AuthzError;
use forms_core::auth::jwt::DecodeFailure;
use forms_core::auth::refresh::RefreshError;
use forms_core::users::UserError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Client-visible message for every rejected bearer token.
pub const INVALID_TOKEN_MESSAGE: &str = "Could not validate credentials";

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A presented bearer token failed to decode. The reason goes into the
    /// challenge header only.
    #[error("Invalid token: {0}")]
    InvalidToken(DecodeFailure),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

fn challenge(failure: Option<&DecodeFailure>) -> HeaderValue {
    match failure {
        None => HeaderValue::from_static("Bearer"),
        Some(f) => HeaderValue::from_str(&format!(
            "Bearer error=\"invalid_token\", error_description=\"{}\"",
            f.reason()
        ))
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer error=\"invalid_token\"")),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", INVALID_TOKEN_MESSAGE)
            }
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::Internal(m) => {
                error!("internal error: {m}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        let mut response = (status, body).into_response();
        match &self {
            AppError::Unauthorized(_) => {
                response.headers_mut().insert(WWW_AUTHENTICATE, challenge(None));
            }
            AppError::InvalidToken(failure) => {
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, challenge(Some(failure)));
            }
            _ => {}
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Incorrect email or password".into())
            }
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::Db(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AuthzError> for AppError {
    fn from(e: AuthzError) -> Self {
        match e {
            AuthzError::Unauthenticated(None) => AppError::Unauthorized("Not authenticated".into()),
            AuthzError::Unauthenticated(Some(failure)) => AppError::InvalidToken(failure),
            AuthzError::Forbidden => AppError::Forbidden("Admin privileges required".into()),
        }
    }
}

impl From<RefreshError> for AppError {
    fn from(e: RefreshError) -> Self {
        match e {
            RefreshError::Decode(failure) => AppError::InvalidToken(failure),
            RefreshError::Issue(e) => AppError::from(e),
        }
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Validation(msg) => AppError::Validation(msg),
            UserError::Db(e) => AppError::from(e),
            UserError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

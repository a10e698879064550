//! Authentication middleware: Bearer token extraction and the three access
//! policies: required, optional and admin-only.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use forms_core::auth::authorize;
use forms_core::models::auth::Principal;

use crate::AppState;
use crate::error::AppError;

/// Principal of a request that passed `require_user` or `require_admin`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

/// Principal of a request behind `optional_user`; `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Principal>);

/// The token from an `Authorization: Bearer <token>` header.
///
/// Any other scheme, or an empty token, counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Axum middleware: rejects the request with 401 unless it carries a valid
/// token, and injects `CurrentUser` into request extensions.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = authorize::require_user(bearer_token(request.headers()), &state.config.auth)?;
    request.extensions_mut().insert(CurrentUser(principal));
    Ok(next.run(request).await)
}

/// Axum middleware: never rejects. Injects `MaybeUser`, populated only for
/// a valid token.
pub async fn optional_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = authorize::optional_user(bearer_token(request.headers()), &state.config.auth);
    request.extensions_mut().insert(MaybeUser(principal));
    next.run(request).await
}

/// Axum middleware: like `require_user`, then 403 unless the principal is
/// an admin.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = authorize::require_admin(bearer_token(request.headers()), &state.config.auth)?;
    request.extensions_mut().insert(CurrentUser(principal));
    Ok(next.run(request).await)
}

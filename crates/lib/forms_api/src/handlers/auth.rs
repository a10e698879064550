//! Authentication request handlers.

use axum::extract::rejection::FormRejection;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::{Extension, Form, Json};
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{CurrentUser, bearer_token};
use crate::models::{
    DebugTokenQuery, DebugTokenResponse, LoginForm, RefreshQuery, RefreshRequest,
    RefreshResponse, TokenResponse,
};
use crate::services::auth;

/// `POST /auth/login`: authenticate with a form-encoded email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Form(form) = form.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let resp = auth::login(
        state.credentials.as_ref(),
        &state.config.auth,
        &form.username,
        &form.password,
    )
    .await?;
    Ok(Json(resp))
}

/// Read `refresh_token` from a JSON or form-encoded body.
async fn refresh_token_from_body(request: Request, state: &AppState) -> AppResult<String> {
    let missing = || AppError::Validation("refresh_token is required".into());
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let body = if is_json {
        Json::<RefreshRequest>::from_request(request, state)
            .await
            .map(|Json(body)| body)
            .map_err(|_| missing())?
    } else {
        Form::<RefreshRequest>::from_request(request, state)
            .await
            .map(|Form(body)| body)
            .map_err(|_| missing())?
    };
    Ok(body.refresh_token)
}

/// `POST /auth/refresh-token`: exchange a previously issued token for a
/// new access token. The token may come from the query string or the body.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
    request: Request,
) -> AppResult<Json<RefreshResponse>> {
    let token = match query.refresh_token {
        Some(token) => token,
        None => refresh_token_from_body(request, &state).await?,
    };
    let resp = auth::refresh_access_token(&token, &state.config.auth)?;
    Ok(Json(resp))
}

/// `GET /auth/debug-token`: admin only. Decodes the `token` query parameter,
/// or the caller's own bearer token, without enforcing expiry.
pub async fn debug_token_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(query): Query<DebugTokenQuery>,
    headers: HeaderMap,
) -> AppResult<Json<DebugTokenResponse>> {
    let token = match query.token.as_deref() {
        Some(token) => token,
        None => bearer_token(&headers)
            .ok_or_else(|| AppError::Validation("No token to inspect".into()))?,
    };
    info!(caller = caller.subject(), "debug-token inspection");
    let resp = auth::inspect_token(token, &state.config.auth)?;
    Ok(Json(resp))
}

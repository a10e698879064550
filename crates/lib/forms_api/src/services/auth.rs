//! Authentication service: login, refresh and token diagnostics delegating
//! to `forms_core::auth`.

use chrono::{DateTime, Utc};
use forms_core::auth::authenticator::authenticate;
use forms_core::auth::jwt::{decode_token, issue_access_token, issue_identity_token};
use forms_core::auth::refresh::refresh;
use forms_core::auth::store::CredentialStore;
use forms_core::models::auth::ClaimSet;
use forms_core::settings::AuthSettings;

use crate::error::{AppError, AppResult};
use crate::models::{DebugTokenResponse, RefreshResponse, TokenResponse};

/// `token_type` on every token response.
const TOKEN_TYPE: &str = "bearer";

/// Authenticate with email + password and issue an access/identity token pair.
pub async fn login(
    store: &dyn CredentialStore,
    settings: &AuthSettings,
    email: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let user = authenticate(store, email, password).await?;

    let access_ttl = settings.access_token_ttl();
    let access_token = issue_access_token(&user, Some(access_ttl), settings)?;
    let id_token = issue_identity_token(&user, Some(settings.identity_token_ttl()), settings)?;

    Ok(TokenResponse {
        access_token,
        id_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: access_ttl.num_seconds(),
    })
}

/// Mint a new access token from a previously issued token of either kind.
pub fn refresh_access_token(token: &str, settings: &AuthSettings) -> AppResult<RefreshResponse> {
    let access_token = refresh(token, settings)?;
    Ok(RefreshResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
    })
}

/// Decode `token` without enforcing expiry and report when it expires.
///
/// Decode failures surface their raw message as a validation error.
pub fn inspect_token(token: &str, settings: &AuthSettings) -> AppResult<DebugTokenResponse> {
    let claims =
        decode_token(token, false, settings).map_err(|e| AppError::Validation(e.to_string()))?;
    let exp = claims.expiry();
    let remaining_seconds = exp - Utc::now().timestamp();
    Ok(DebugTokenResponse {
        kind: claims.kind(),
        issued_at: claims.issued_at().and_then(|iat| DateTime::from_timestamp(iat, 0)),
        expires_at: DateTime::from_timestamp(exp, 0),
        remaining_seconds,
        expired: remaining_seconds < 0,
        payload: claims,
    })
}

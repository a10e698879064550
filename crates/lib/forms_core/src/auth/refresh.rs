//! Exchange a previously issued token for a fresh access token.

use thiserror::Error;
use tracing::info;

use super::AuthError;
use super::jwt::{DecodeFailure, access_claims, decode_token, sign_access};
use crate::models::auth::ClaimSet;
use crate::settings::AuthSettings;

/// Refresh errors.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Decode(#[from] DecodeFailure),

    #[error(transparent)]
    Issue(#[from] AuthError),
}

/// Decode `old_token` (either kind, expiry enforced) and mint a new access
/// token for its subject.
///
/// Only the subject carries over; admin and profile claims do not. Nothing
/// is recorded, so the old token stays usable until its own expiry.
pub fn refresh(old_token: &str, settings: &AuthSettings) -> Result<String, RefreshError> {
    let claims = decode_token(old_token, true, settings)?;
    let fresh = access_claims(claims.subject(), None, settings.access_token_ttl());
    let token = sign_access(&fresh, settings)?;
    info!(kind = ?claims.kind(), "access token refreshed");
    Ok(token)
}

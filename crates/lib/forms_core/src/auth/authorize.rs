//! Bearer-token access policies.
//!
//! All three policies share `decode_token`; they differ only in how a
//! missing or bad token is treated.

use thiserror::Error;
use tracing::debug;

use super::jwt::{DecodeFailure, decode_token};
use crate::models::auth::Principal;
use crate::settings::AuthSettings;

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// No token, or one that failed to decode (`None` means no token).
    #[error("Not authenticated")]
    Unauthenticated(Option<DecodeFailure>),

    #[error("Admin privileges required")]
    Forbidden,
}

/// A token must be present and valid.
pub fn require_user(token: Option<&str>, settings: &AuthSettings) -> Result<Principal, AuthzError> {
    let Some(token) = token else {
        return Err(AuthzError::Unauthenticated(None));
    };
    decode_token(token, true, settings)
        .map(Principal::from)
        .map_err(|failure| {
            debug!(reason = failure.reason(), "bearer token rejected: {failure}");
            AuthzError::Unauthenticated(Some(failure))
        })
}

/// A valid token yields a principal; anything else yields `None`.
pub fn optional_user(token: Option<&str>, settings: &AuthSettings) -> Option<Principal> {
    let token = token?;
    match decode_token(token, true, settings) {
        Ok(claims) => Some(Principal::from(claims)),
        Err(failure) => {
            debug!(reason = failure.reason(), "ignoring bad optional bearer token");
            None
        }
    }
}

/// The principal must carry an admin flag, top-level or in its profile.
pub fn ensure_admin(principal: Principal) -> Result<Principal, AuthzError> {
    if principal.is_admin() {
        Ok(principal)
    } else {
        debug!(subject = principal.subject(), "admin check failed");
        Err(AuthzError::Forbidden)
    }
}

/// `require_user` followed by `ensure_admin`.
pub fn require_admin(token: Option<&str>, settings: &AuthSettings) -> Result<Principal, AuthzError> {
    ensure_admin(require_user(token, settings)?)
}

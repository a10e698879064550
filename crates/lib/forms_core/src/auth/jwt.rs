//! JWT token issuance and decoding.
//!
//! Two token kinds share one HS256 signing key: short-lived access tokens
//! carrying authorization claims, and longer-lived identity tokens carrying
//! the user profile. The key is resolved from `AuthSettings` on every call.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AuthError;
use crate::models::auth::{
    AccessClaims, AuthenticatedUser, ClaimSet, Claims, IdentityClaims, Profile,
};
use crate::settings::AuthSettings;

/// `iss` claim on every token.
pub const ISSUER: &str = "forms-anyware-api";

/// `aud` claim on access tokens.
pub const ACCESS_AUDIENCE: &str = "forms-anyware-api";

/// `aud` claim on identity tokens.
pub const IDENTITY_AUDIENCE: &str = "forms-anyware-client";

/// `scope` claim on access tokens.
pub const ACCESS_SCOPE: &str = "read:forms write:forms";

/// Access token lifetime when none is given: 30 minutes.
const DEFAULT_ACCESS_TTL_SECS: i64 = 30 * 60;

/// Identity token lifetime when none is given: 7 days.
const DEFAULT_IDENTITY_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Why a token failed to decode.
///
/// Callers can tell these apart: an expired token warrants a refresh, a
/// malformed one a new login, a schema failure a client fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    /// Bad structure, encoding, algorithm or signature.
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token has expired")]
    Expired,

    /// Signature valid but the payload lacks `sub`/`exp` or has wrong types.
    #[error("Invalid token payload: {0}")]
    InvalidSchema(String),
}

impl DecodeFailure {
    /// Short machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeFailure::Malformed(_) => "malformed",
            DecodeFailure::Expired => "expired",
            DecodeFailure::InvalidSchema(_) => "invalid_schema",
        }
    }
}

/// Wire shape accepted by `decode_token`; classified into `Claims` afterwards.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
    exp: i64,
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    is_admin: Option<bool>,
    #[serde(default)]
    is_sys_admin: Option<bool>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    profile: Option<Profile>,
}

impl From<RawClaims> for Claims {
    fn from(raw: RawClaims) -> Self {
        match raw.profile {
            Some(profile) => Claims::Identity(IdentityClaims {
                sub: raw.sub,
                is_admin: raw.is_admin,
                is_sys_admin: raw.is_sys_admin,
                iss: raw.iss,
                aud: raw.aud,
                iat: raw.iat,
                profile,
                exp: raw.exp,
            }),
            None => Claims::Access(AccessClaims {
                sub: raw.sub,
                is_admin: raw.is_admin,
                is_sys_admin: raw.is_sys_admin,
                iss: raw.iss,
                aud: raw.aud,
                iat: raw.iat,
                scope: raw.scope,
                exp: raw.exp,
            }),
        }
    }
}

fn sign<T: Serialize>(claims: &T, settings: &AuthSettings) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(settings.signing_key()),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Build access claims for `subject`, expiring `ttl` from now.
pub(crate) fn access_claims(subject: &str, is_admin: Option<bool>, ttl: Duration) -> AccessClaims {
    let now = Utc::now();
    AccessClaims {
        sub: subject.to_string(),
        is_admin,
        is_sys_admin: None,
        iss: Some(ISSUER.to_string()),
        aud: Some(ACCESS_AUDIENCE.to_string()),
        iat: Some(now.timestamp()),
        scope: Some(ACCESS_SCOPE.to_string()),
        exp: (now + ttl).timestamp(),
    }
}

/// Sign an access claim set.
pub(crate) fn sign_access(claims: &AccessClaims, settings: &AuthSettings) -> Result<String, AuthError> {
    sign(claims, settings)
}

/// Issue a signed access token (HS256, default 30 min expiry).
pub fn issue_access_token(
    user: &AuthenticatedUser,
    ttl: Option<Duration>,
    settings: &AuthSettings,
) -> Result<String, AuthError> {
    let ttl = ttl.unwrap_or_else(|| Duration::seconds(DEFAULT_ACCESS_TTL_SECS));
    let claims = access_claims(&user.email, Some(user.is_admin), ttl);
    sign(&claims, settings)
}

/// Issue a signed identity token (HS256, default 7 day expiry).
pub fn issue_identity_token(
    user: &AuthenticatedUser,
    ttl: Option<Duration>,
    settings: &AuthSettings,
) -> Result<String, AuthError> {
    let ttl = ttl.unwrap_or_else(|| Duration::seconds(DEFAULT_IDENTITY_TTL_SECS));
    let now = Utc::now();
    let claims = IdentityClaims {
        sub: user.email.clone(),
        is_admin: None,
        is_sys_admin: None,
        iss: Some(ISSUER.to_string()),
        aud: Some(IDENTITY_AUDIENCE.to_string()),
        iat: Some(now.timestamp()),
        profile: Profile::from(user),
        exp: (now + ttl).timestamp(),
    };
    sign(&claims, settings)
}

/// Verify a token's signature and decode its claims.
///
/// The audience is not checked: access and identity tokens differ only in
/// `aud` and either may identify a caller. When `verify_expiry` is set a
/// token whose `exp` lies in the past fails with `DecodeFailure::Expired`;
/// there is no leeway.
pub fn decode_token(
    token: &str,
    verify_expiry: bool,
    settings: &AuthSettings,
) -> Result<Claims, DecodeFailure> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let payload = decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(settings.signing_key()),
        &validation,
    )
    .map_err(|e| DecodeFailure::Malformed(e.to_string()))?
    .claims;

    let raw: RawClaims =
        serde_json::from_value(payload).map_err(|e| DecodeFailure::InvalidSchema(e.to_string()))?;
    let claims = Claims::from(raw);

    if verify_expiry && claims.expiry() < Utc::now().timestamp() {
        return Err(DecodeFailure::Expired);
    }
    Ok(claims)
}

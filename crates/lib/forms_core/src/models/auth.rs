//! Authentication domain models.
//!
//! Credential records as stored, the authenticated user handed to the token
//! codec, the two claim sets carried by signed tokens, and the `Principal`
//! derived from a validated token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User row consulted during login.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A user whose credentials have just been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl AuthenticatedUser {
    /// Builds the user from a credential record, stamping `last_login`.
    pub fn from_record(record: CredentialRecord, last_login: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            username: record.username,
            is_admin: record.is_admin,
            last_login: Some(last_login),
        }
    }
}

/// Which of the two token shapes a claim set has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Identity,
}

/// Fields every claim set guarantees.
pub trait ClaimSet {
    /// The `sub` claim (user email).
    fn subject(&self) -> &str;
    /// The `exp` claim (unix seconds).
    fn expiry(&self) -> i64;
}

/// Profile embedded in identity tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// Legacy spelling of `is_admin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sys_admin: Option<bool>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl Profile {
    /// True if either admin spelling is set.
    pub fn is_admin(&self) -> bool {
        self.is_admin == Some(true) || self.is_sys_admin == Some(true)
    }
}

impl From<&AuthenticatedUser> for Profile {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            is_admin: Some(user.is_admin),
            is_sys_admin: None,
            last_login: user.last_login,
        }
    }
}

/// Claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// Legacy spelling of `is_admin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sys_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub exp: i64,
}

impl ClaimSet for AccessClaims {
    fn subject(&self) -> &str {
        &self.sub
    }

    fn expiry(&self) -> i64 {
        self.exp
    }
}

/// Claims carried by identity tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    /// Top-level admin flag; takes precedence over `profile.is_admin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sys_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub profile: Profile,
    pub exp: i64,
}

impl ClaimSet for IdentityClaims {
    fn subject(&self) -> &str {
        &self.sub
    }

    fn expiry(&self) -> i64 {
        self.exp
    }
}

/// A decoded claim set of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Claims {
    Access(AccessClaims),
    Identity(IdentityClaims),
}

impl Claims {
    pub fn kind(&self) -> TokenKind {
        match self {
            Claims::Access(_) => TokenKind::Access,
            Claims::Identity(_) => TokenKind::Identity,
        }
    }

    pub fn issued_at(&self) -> Option<i64> {
        match self {
            Claims::Access(c) => c.iat,
            Claims::Identity(c) => c.iat,
        }
    }
}

impl ClaimSet for Claims {
    fn subject(&self) -> &str {
        match self {
            Claims::Access(c) => c.subject(),
            Claims::Identity(c) => c.subject(),
        }
    }

    fn expiry(&self) -> i64 {
        match self {
            Claims::Access(c) => c.expiry(),
            Claims::Identity(c) => c.expiry(),
        }
    }
}

/// The identity derived from a validated token.
///
/// Only constructed from a fully decoded claim set; fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    subject: String,
    kind: TokenKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_sys_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_at: Option<i64>,
    expires_at: i64,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        match claims {
            Claims::Access(c) => Self {
                subject: c.sub,
                kind: TokenKind::Access,
                is_admin: c.is_admin,
                is_sys_admin: c.is_sys_admin,
                scope: c.scope,
                profile: None,
                issued_at: c.iat,
                expires_at: c.exp,
            },
            Claims::Identity(c) => Self {
                subject: c.sub,
                kind: TokenKind::Identity,
                is_admin: c.is_admin,
                is_sys_admin: c.is_sys_admin,
                scope: None,
                profile: Some(c.profile),
                issued_at: c.iat,
                expires_at: c.exp,
            },
        }
    }
}

impl Principal {
    /// The `sub` claim (user email).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Numeric user id, known only for identity tokens.
    pub fn user_id(&self) -> Option<i64> {
        self.profile.as_ref().map(|p| p.id)
    }

    pub fn username(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|p| p.username.as_deref())
    }

    /// "First Last" from the profile, or the subject when there is none.
    pub fn display_name(&self) -> String {
        match &self.profile {
            Some(p) if !(p.first_name.is_empty() && p.last_name.is_empty()) => {
                format!("{} {}", p.first_name, p.last_name).trim().to_string()
            }
            _ => self.subject.clone(),
        }
    }

    /// Admin check across both token shapes.
    ///
    /// The top-level flag (access tokens) is consulted first; when it is
    /// absent or false the nested `profile` flag (identity tokens) decides.
    pub fn is_admin(&self) -> bool {
        if self.is_admin == Some(true) || self.is_sys_admin == Some(true) {
            return true;
        }
        self.profile.as_ref().is_some_and(Profile::is_admin)
    }
}

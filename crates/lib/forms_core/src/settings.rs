//! Authentication settings: signing secrets and token lifetimes.

use chrono::Duration;
use thiserror::Error;

/// Fallback application secret for local development.
pub const DEFAULT_SECRET_KEY: &str = "secret-key-change-this-in-production";

/// Signing algorithm name. Only HMAC-SHA256 is supported.
pub const ALGORITHM: &str = "HS256";

/// Default access token lifetime in minutes.
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

/// Default refresh/identity token lifetime in days.
pub const DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS: i64 = 7;

/// Invalid settings value read from the environment.
#[derive(Debug, Error)]
#[error("invalid value for {var}: {value:?} ({reason})")]
pub struct SettingsError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Secret key material and token lifetimes consumed by the auth core.
#[derive(Clone, Debug)]
pub struct AuthSettings {
    /// General application secret.
    pub secret_key: String,
    /// Dedicated JWT signing secret. Takes precedence over `secret_key`.
    pub jwt_secret_key: Option<String>,
    /// Access token lifetime in minutes.
    pub access_token_expire_minutes: i64,
    /// Refresh/identity token lifetime in days.
    pub refresh_token_expire_days: i64,
}

impl AuthSettings {
    /// Settings signing with `secret` and default lifetimes.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret.into(),
            jwt_secret_key: None,
            access_token_expire_minutes: DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            refresh_token_expire_days: DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS,
        }
    }

    /// Reads settings from environment variables.
    ///
    /// | Variable                      | Default                         |
    /// |-------------------------------|---------------------------------|
    /// | `SECRET_KEY`                  | development placeholder         |
    /// | `JWT_SECRET_KEY`              | unset (falls back to the above) |
    /// | `ACCESS_TOKEN_EXPIRE_MINUTES` | `30`                            |
    /// | `REFRESH_TOKEN_EXPIRE_DAYS`   | `7`                             |
    pub fn from_env() -> Result<Self, SettingsError> {
        let secret_key = non_empty_var("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.into());
        Ok(Self {
            secret_key,
            jwt_secret_key: non_empty_var("JWT_SECRET_KEY"),
            access_token_expire_minutes: positive_var(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            )?,
            refresh_token_expire_days: positive_var(
                "REFRESH_TOKEN_EXPIRE_DAYS",
                DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS,
            )?,
        })
    }

    /// The key tokens are signed and verified with: `jwt_secret_key` if set,
    /// otherwise `secret_key`.
    pub fn signing_key(&self) -> &[u8] {
        match self.jwt_secret_key.as_deref() {
            Some(key) if !key.is_empty() => key.as_bytes(),
            _ => self.secret_key.as_bytes(),
        }
    }

    /// Access token lifetime.
    pub fn access_token_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_expire_minutes)
    }

    /// Identity token lifetime. Shares the refresh lifetime setting.
    pub fn identity_token_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_expire_days)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn positive_var(name: &'static str, default: i64) -> Result<i64, SettingsError> {
    let Some(raw) = non_empty_var(name) else {
        return Ok(default);
    };
    let parsed = raw.trim().parse::<i64>().map_err(|e| SettingsError {
        var: name,
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    if parsed <= 0 {
        return Err(SettingsError {
            var: name,
            value: raw,
            reason: "must be positive".into(),
        });
    }
    Ok(parsed)
}

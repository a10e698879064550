//! API server configuration.

use forms_core::settings::{AuthSettings, SettingsError};

/// Origins allowed by CORS when `BACKEND_CORS_ORIGINS` is unset.
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5000"];

/// Deployment environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parses `ENVIRONMENT`, case-insensitively. Unknown values are
    /// treated as development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" => Environment::Production,
            "testing" => Environment::Testing,
            _ => Environment::Development,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:5000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    pub environment: Environment,
    /// Token signing secrets and lifetimes.
    pub auth: AuthSettings,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                                      |
    /// |------------------------|----------------------------------------------|
    /// | `BIND_ADDR`            | `0.0.0.0:5000`                               |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/forms_anyware`    |
    /// | `BACKEND_CORS_ORIGINS` | `http://localhost:3000,http://localhost:5000`|
    /// | `ENVIRONMENT`          | `development`                                |
    ///
    /// Auth variables are documented on `AuthSettings::from_env`.
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/forms_anyware".into()),
            cors_origins: std::env::var("BACKEND_CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_else(|_| default_origins()),
            environment: std::env::var("ENVIRONMENT")
                .map(|v| Environment::parse(&v))
                .unwrap_or(Environment::Development),
            auth: AuthSettings::from_env()?,
        })
    }
}

fn default_origins() -> Vec<String> {
    DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
}

/// Accepts a comma-separated list or a JSON array of origins.
pub fn parse_origins(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.starts_with('[')
        && let Ok(list) = serde_json::from_str::<Vec<String>>(raw)
    {
        return list;
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

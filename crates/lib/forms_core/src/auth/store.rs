//! Credential lookup seam used by the authenticator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::AuthError;
use crate::models::auth::CredentialRecord;

/// Read access to user credentials plus the last-login stamp.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive email match among rows without a soft-delete marker.
    async fn find_active_by_email(&self, email: &str)
    -> Result<Option<CredentialRecord>, AuthError>;

    /// Overwrite the user's last-login timestamp.
    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AuthError>;
}

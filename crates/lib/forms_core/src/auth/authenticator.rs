//! Email + password authentication.

use std::sync::LazyLock;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::AuthError;
use super::password::{hash_password, verify_password};
use super::store::CredentialStore;
use crate::models::auth::AuthenticatedUser;

/// Hash verified against when no user matches, so a miss costs as much as
/// a wrong password.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("forms-anyware-dummy-password").unwrap_or_default());

type Verifier = fn(&str, &str) -> Result<bool, AuthError>;

/// Check `email`/`password` against the credential store.
///
/// Unknown email, soft-deleted user, wrong password and an unreadable
/// stored hash all yield `AuthError::InvalidCredentials`. On success the
/// user's last-login is written exactly once.
pub async fn authenticate(
    store: &dyn CredentialStore,
    email: &str,
    password: &str,
) -> Result<AuthenticatedUser, AuthError> {
    authenticate_with(store, email, password, verify_password, &DUMMY_HASH).await
}

async fn authenticate_with(
    store: &dyn CredentialStore,
    email: &str,
    password: &str,
    verify: Verifier,
    dummy_hash: &str,
) -> Result<AuthenticatedUser, AuthError> {
    let record = store.find_active_by_email(email).await?;
    let hash = match &record {
        Some(record) => record.password_hash.clone(),
        None => dummy_hash.to_owned(),
    };

    // bcrypt is CPU-bound; keep it off the async workers.
    let password = password.to_owned();
    let verified = tokio::task::spawn_blocking(move || verify(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("password check task: {e}")))?;

    let Some(record) = record else {
        debug!("login rejected: no active user for email");
        return Err(AuthError::InvalidCredentials);
    };

    match verified {
        Ok(true) => {}
        Ok(false) => {
            debug!(user_id = record.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => {
            warn!(user_id = record.id, "stored password hash unreadable: {e}");
            return Err(AuthError::InvalidCredentials);
        }
    }

    let now = Utc::now();
    store.record_login(record.id, now).await?;
    info!(user_id = record.id, "user logged in");

    Ok(AuthenticatedUser::from_record(record, now))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::models::auth::CredentialRecord;

    #[derive(Default)]
    struct FakeStore {
        records: Vec<CredentialRecord>,
        logins: Mutex<Vec<(i64, DateTime<Utc>)>>,
    }

    #[async_trait]
    impl CredentialStore for FakeStore {
        async fn find_active_by_email(
            &self,
            email: &str,
        ) -> Result<Option<CredentialRecord>, AuthError> {
            Ok(self
                .records
                .iter()
                .find(|r| r.email == email && r.deleted_at.is_none())
                .cloned())
        }

        async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AuthError> {
            self.logins.lock().unwrap().push((user_id, at));
            Ok(())
        }
    }

    fn record(id: i64, email: &str, password: &str) -> CredentialRecord {
        CredentialRecord {
            id,
            email: email.into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            username: Some("first.last".into()),
            password_hash: bcrypt::hash(password, 4).unwrap(),
            is_admin: true,
            last_login: None,
            deleted_at: None,
        }
    }

    fn store() -> FakeStore {
        let mut deleted = record(2, "gone@example.com", "secret");
        deleted.deleted_at = Some(Utc::now());
        let mut corrupt = record(3, "corrupt@example.com", "secret");
        corrupt.password_hash = "plaintext".into();
        FakeStore {
            records: vec![record(1, "user@example.com", "secret"), deleted, corrupt],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn valid_credentials_return_user_and_stamp_login() {
        let store = store();
        let user = authenticate(&store, "user@example.com", "secret").await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.email, "user@example.com");
        assert!(user.is_admin);

        let logins = store.logins.lock().unwrap();
        assert_eq!(logins.len(), 1);
        assert_eq!(logins[0].0, 1);
        assert_eq!(user.last_login, Some(logins[0].1));
    }

    static VERIFY_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting_verify(password: &str, hash: &str) -> Result<bool, AuthError> {
        VERIFY_CALLS.fetch_add(1, Ordering::SeqCst);
        verify_password(password, hash)
    }

    #[tokio::test]
    async fn every_attempt_pays_for_a_hash_check() {
        let store = store();
        let dummy = bcrypt::hash("dummy", 4).unwrap();
        let cases = [
            ("nobody@example.com", "secret"),
            ("gone@example.com", "secret"),
            ("user@example.com", "wrong"),
        ];
        for (email, password) in cases {
            let before = VERIFY_CALLS.load(Ordering::SeqCst);
            let err = authenticate_with(&store, email, password, counting_verify, &dummy)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(VERIFY_CALLS.load(Ordering::SeqCst), before + 1, "{email}");
        }
    }

    #[tokio::test]
    async fn failures_are_indistinguishable() {
        let store = store();
        let dummy = bcrypt::hash("dummy", 4).unwrap();
        let cases = [
            ("nobody@example.com", "secret"),
            ("user@example.com", "wrong"),
            ("USER@example.com", "secret"),
            ("gone@example.com", "secret"),
            ("corrupt@example.com", "secret"),
        ];
        for (email, password) in cases {
            let err = authenticate_with(&store, email, password, verify_password, &dummy)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials), "{email}: {err:?}");
            assert_eq!(err.to_string(), "Invalid credentials");
        }
        assert!(store.logins.lock().unwrap().is_empty());
    }
}

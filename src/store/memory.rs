//! In-process credential store for local dev and tests.
//!
//! A single mutex serializes every mutation, so secret consumption and the
//! associated record change are atomic and exactly-once under concurrency,
//! matching the Postgres implementation.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use super::{
    generate_raw_secret, hash_password, hash_secret, verify_password, CreateOutcome,
    CredentialStore, PasswordPolicy, RegistrationCandidate, SecretPurpose, UserCredential,
};

#[derive(Debug, Clone)]
struct StoredUser {
    credential: UserCredential,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct SecretEntry {
    secret_hash: Vec<u8>,
    expires_at: SystemTime,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, StoredUser>,
    secrets: HashMap<(Uuid, SecretPurpose), SecretEntry>,
}

#[derive(Debug)]
pub struct MemoryCredentialStore {
    policy: PasswordPolicy,
    secret_ttl: Duration,
    inner: Mutex<Inner>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new(policy: PasswordPolicy, secret_ttl: Duration) -> Self {
        Self {
            policy,
            secret_ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn generate_secret(&self, user_id: Uuid, purpose: SecretPurpose) -> Result<String> {
        let raw = generate_raw_secret()?;
        let entry = SecretEntry {
            secret_hash: hash_secret(&raw),
            expires_at: SystemTime::now() + self.secret_ttl,
        };
        let mut inner = self.lock();
        // Replacing the entry invalidates any previously issued secret for
        // the same (user, purpose) pair.
        inner.secrets.insert((user_id, purpose), entry);
        Ok(raw)
    }

    /// Remove the secret if it matches and is still live. Runs under the
    /// lock held by the caller so the removal and the record mutation stay
    /// one atomic unit.
    fn take_matching_secret(
        inner: &mut Inner,
        user_id: Uuid,
        purpose: SecretPurpose,
        raw_secret: &str,
    ) -> bool {
        let key = (user_id, purpose);
        let live = inner.secrets.get(&key).is_some_and(|entry| {
            entry.secret_hash == hash_secret(raw_secret) && entry.expires_at > SystemTime::now()
        });
        if live {
            inner.secrets.remove(&key);
        }
        live
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens if a holder panicked; recover the data.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new(PasswordPolicy::new(), Duration::from_secs(24 * 60 * 60))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_login(&self, login_name: &str) -> Result<Option<UserCredential>> {
        let inner = self.lock();
        Ok(inner
            .users
            .values()
            .find(|user| user.credential.login_name == login_name)
            .map(|user| user.credential.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>> {
        let inner = self.lock();
        Ok(inner
            .users
            .values()
            .find(|user| user.credential.email == email)
            .map(|user| user.credential.clone()))
    }

    async fn create(
        &self,
        candidate: RegistrationCandidate,
        password: &str,
    ) -> Result<CreateOutcome> {
        let errors = self.policy.validate(password);
        if !errors.is_empty() {
            return Ok(CreateOutcome::Invalid(errors));
        }

        let password_hash = hash_password(password)?;
        let mut inner = self.lock();
        let collision = inner.users.values().any(|user| {
            user.credential.email == candidate.email
                || user.credential.login_name == candidate.login_name
        });
        if collision {
            return Ok(CreateOutcome::Duplicate);
        }

        let credential = UserCredential {
            id: Uuid::new_v4(),
            login_name: candidate.login_name,
            email: candidate.email,
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            email_confirmed: false,
        };
        inner.users.insert(
            credential.id,
            StoredUser {
                credential: credential.clone(),
                password_hash,
            },
        );
        Ok(CreateOutcome::Created(credential))
    }

    async fn check_password(&self, user: &UserCredential, password: &str) -> Result<bool> {
        let stored_hash = {
            let inner = self.lock();
            inner.users.get(&user.id).map(|user| user.password_hash.clone())
        };
        match stored_hash {
            Some(hash) => verify_password(password, &hash),
            None => Ok(false),
        }
    }

    async fn generate_confirmation_secret(&self, user: &UserCredential) -> Result<String> {
        self.generate_secret(user.id, SecretPurpose::ConfirmEmail)
    }

    async fn consume_confirmation_secret(
        &self,
        user: &UserCredential,
        raw_secret: &str,
    ) -> Result<bool> {
        let mut inner = self.lock();
        if !Self::take_matching_secret(&mut inner, user.id, SecretPurpose::ConfirmEmail, raw_secret)
        {
            return Ok(false);
        }
        if let Some(stored) = inner.users.get_mut(&user.id) {
            stored.credential.email_confirmed = true;
        }
        Ok(true)
    }

    async fn generate_reset_secret(&self, user: &UserCredential) -> Result<String> {
        self.generate_secret(user.id, SecretPurpose::ResetPassword)
    }

    async fn consume_reset_secret(
        &self,
        user: &UserCredential,
        raw_secret: &str,
        new_password: &str,
    ) -> Result<bool> {
        // Hash outside the lock; discard the work if the secret lost the race.
        let password_hash = hash_password(new_password)?;
        let mut inner = self.lock();
        if !Self::take_matching_secret(&mut inner, user.id, SecretPurpose::ResetPassword, raw_secret)
        {
            return Ok(false);
        }
        if let Some(stored) = inner.users.get_mut(&user.id) {
            stored.password_hash = password_hash;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(email: &str) -> RegistrationCandidate {
        RegistrationCandidate {
            login_name: email.to_string(),
            email: email.to_string(),
            first_name: "alice".to_string(),
            last_name: "liddell".to_string(),
        }
    }

    async fn created(store: &MemoryCredentialStore, email: &str) -> UserCredential {
        match store.create(candidate(email), "Secretpass1").await.unwrap() {
            CreateOutcome::Created(user) => user,
            other => panic!("expected created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_policy_violations_per_field() {
        let store = MemoryCredentialStore::default();
        let outcome = store.create(candidate("alice@example.com"), "weak").await.unwrap();
        match outcome {
            CreateOutcome::Invalid(errors) => {
                assert!(errors.fields.contains_key("password"));
            }
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryCredentialStore::default();
        created(&store, "alice@example.com").await;
        let outcome = store
            .create(candidate("alice@example.com"), "Secretpass1")
            .await
            .unwrap();
        assert!(matches!(outcome, CreateOutcome::Duplicate));
    }

    #[tokio::test]
    async fn check_password_returns_false_on_mismatch() {
        let store = MemoryCredentialStore::default();
        let user = created(&store, "alice@example.com").await;
        assert!(store.check_password(&user, "Secretpass1").await.unwrap());
        assert!(!store.check_password(&user, "Wrongpass1").await.unwrap());
    }

    #[tokio::test]
    async fn confirmation_secret_consumes_exactly_once() {
        let store = MemoryCredentialStore::default();
        let user = created(&store, "alice@example.com").await;
        let secret = store.generate_confirmation_secret(&user).await.unwrap();

        assert!(store.consume_confirmation_secret(&user, &secret).await.unwrap());
        let confirmed = store
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(confirmed.email_confirmed);

        // Replay with the same raw secret fails.
        assert!(!store.consume_confirmation_secret(&user, &secret).await.unwrap());
    }

    #[tokio::test]
    async fn regenerating_invalidates_previous_secret() {
        let store = MemoryCredentialStore::default();
        let user = created(&store, "alice@example.com").await;
        let first = store.generate_confirmation_secret(&user).await.unwrap();
        let second = store.generate_confirmation_secret(&user).await.unwrap();

        assert!(!store.consume_confirmation_secret(&user, &first).await.unwrap());
        assert!(store.consume_confirmation_secret(&user, &second).await.unwrap());
    }

    #[tokio::test]
    async fn secrets_are_purpose_scoped() {
        let store = MemoryCredentialStore::default();
        let user = created(&store, "alice@example.com").await;
        let reset = store.generate_reset_secret(&user).await.unwrap();

        // A reset secret does not confirm an email.
        assert!(!store.consume_confirmation_secret(&user, &reset).await.unwrap());
        assert!(store
            .consume_reset_secret(&user, &reset, "Newerpass2")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn expired_secret_is_rejected() {
        let store = MemoryCredentialStore::new(PasswordPolicy::new(), Duration::ZERO);
        let user = created(&store, "alice@example.com").await;
        let secret = store.generate_confirmation_secret(&user).await.unwrap();
        assert!(!store.consume_confirmation_secret(&user, &secret).await.unwrap());
    }

    #[tokio::test]
    async fn reset_swaps_password_hash_atomically() {
        let store = MemoryCredentialStore::default();
        let user = created(&store, "alice@example.com").await;
        let secret = store.generate_reset_secret(&user).await.unwrap();

        assert!(store
            .consume_reset_secret(&user, &secret, "Newerpass2")
            .await
            .unwrap());
        assert!(!store.check_password(&user, "Secretpass1").await.unwrap());
        assert!(store.check_password(&user, "Newerpass2").await.unwrap());

        // The consumed secret cannot reset again.
        assert!(!store
            .consume_reset_secret(&user, &secret, "Thirdpass3")
            .await
            .unwrap());
    }
}

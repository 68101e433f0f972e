//! Credential storage: user records, password hashes, and the single-use
//! action secrets behind email confirmation and password reset.
//!
//! Two implementations ship: [`postgres::PgCredentialStore`] for real
//! deployments and [`memory::MemoryCredentialStore`] for local dev and tests.
//! Both uphold the same contract: consuming a secret and applying its state
//! change (confirmed flag or password hash swap) is one atomic unit, and two
//! concurrent consumption attempts for the same secret succeed exactly once.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng as SaltRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// A user credential record as seen by the workflow.
///
/// The password hash never leaves the store; verification goes through
/// [`CredentialStore::check_password`].
#[derive(Debug, Clone)]
pub struct UserCredential {
    pub id: Uuid,
    pub login_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub email_confirmed: bool,
}

/// Fields for a new record. Callers normalize email and login name to lower
/// case before handing the candidate to the store.
#[derive(Debug, Clone)]
pub struct RegistrationCandidate {
    pub login_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Outcome of a create attempt.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(UserCredential),
    /// Email or login name collides with an existing record.
    Duplicate,
    Invalid(ValidationErrors),
}

/// The two purposes an action secret can be scoped to. A secret minted for
/// one purpose never validates for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretPurpose {
    ConfirmEmail,
    ResetPassword,
}

impl SecretPurpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfirmEmail => "confirm-email",
            Self::ResetPassword => "reset-password",
        }
    }
}

/// Per-field validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Configurable password policy enforced on create and reset.
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    min_length: usize,
    require_digit: bool,
    require_lowercase: bool,
    require_uppercase: bool,
}

impl PasswordPolicy {
    /// Default policy: 8+ characters with a digit, a lowercase, and an
    /// uppercase letter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_length: 8,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
        }
    }

    #[must_use]
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    #[must_use]
    pub fn with_require_digit(mut self, required: bool) -> Self {
        self.require_digit = required;
        self
    }

    #[must_use]
    pub fn with_require_lowercase(mut self, required: bool) -> Self {
        self.require_lowercase = required;
        self
    }

    #[must_use]
    pub fn with_require_uppercase(mut self, required: bool) -> Self {
        self.require_uppercase = required;
        self
    }

    /// Check a candidate password, reporting every violated rule under the
    /// `password` field.
    #[must_use]
    pub fn validate(&self, password: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if password.chars().count() < self.min_length {
            errors.push(
                "password",
                format!("must be at least {} characters long", self.min_length),
            );
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("password", "must contain at least one digit");
        }
        if self.require_lowercase && !password.chars().any(char::is_lowercase) {
            errors.push("password", "must contain at least one lowercase letter");
        }
        if self.require_uppercase && !password.chars().any(char::is_uppercase) {
            errors.push("password", "must contain at least one uppercase letter");
        }
        errors
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Collaborator contract consumed by the auth workflow.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact match on the normalized (lower-case) login name.
    async fn find_by_login(&self, login_name: &str) -> Result<Option<UserCredential>>;

    /// Exact match on the normalized (lower-case) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>>;

    /// Hash the password, enforce the password policy, and persist a new
    /// record. Policy violations and uniqueness conflicts come back as
    /// outcomes, not errors.
    async fn create(&self, candidate: RegistrationCandidate, password: &str)
        -> Result<CreateOutcome>;

    /// Verify a password against the stored hash. Mismatch is `false`, never
    /// an error.
    async fn check_password(&self, user: &UserCredential, password: &str) -> Result<bool>;

    /// Mint a fresh confirmation secret for the user, replacing any live one
    /// for the same purpose.
    async fn generate_confirmation_secret(&self, user: &UserCredential) -> Result<String>;

    /// Verify-and-invalidate a confirmation secret. Success also flips
    /// `email_confirmed` to true in the same atomic unit.
    async fn consume_confirmation_secret(
        &self,
        user: &UserCredential,
        raw_secret: &str,
    ) -> Result<bool>;

    /// Mint a fresh reset secret for the user, replacing any live one for the
    /// same purpose.
    async fn generate_reset_secret(&self, user: &UserCredential) -> Result<String>;

    /// Verify-and-invalidate a reset secret. Success also swaps the password
    /// hash in the same atomic unit.
    async fn consume_reset_secret(
        &self,
        user: &UserCredential,
        raw_secret: &str,
        new_password: &str,
    ) -> Result<bool>;
}

/// Mint a raw action secret.
///
/// Standard base64 on purpose: the text can carry `+`, `/`, and `=`, which is
/// why links go through the transport codec instead of embedding it raw.
pub(crate) fn generate_raw_secret() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate action secret")?;
    Ok(Base64::encode_string(&bytes))
}

/// Hash an action secret so raw values never touch storage.
pub(crate) fn hash_secret(raw_secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(raw_secret.as_bytes());
    hasher.finalize().to_vec()
}

/// Hash a password with argon2id and a fresh salt.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut SaltRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Verify a password against a stored argon2 hash.
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| anyhow!("stored hash is invalid: {err}"))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("failed to verify password: {err}")),
    }
}

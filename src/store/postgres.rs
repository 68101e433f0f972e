//! Postgres-backed credential store.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     login_name TEXT NOT NULL UNIQUE,
//!     email TEXT NOT NULL UNIQUE,
//!     first_name TEXT NOT NULL,
//!     last_name TEXT NOT NULL,
//!     password_hash TEXT NOT NULL,
//!     email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE action_secrets (
//!     user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
//!     purpose TEXT NOT NULL,
//!     secret_hash BYTEA NOT NULL,
//!     expires_at TIMESTAMPTZ NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (user_id, purpose)
//! );
//! ```
//!
//! The `(user_id, purpose)` primary key caps live secrets at one per purpose;
//! regenerating upserts over the previous row. Consumption deletes the row and
//! applies the record mutation inside one transaction, so the row lock taken
//! by the `DELETE` guarantees exactly-once semantics under concurrency.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{
    generate_raw_secret, hash_password, hash_secret, verify_password, CreateOutcome,
    CredentialStore, PasswordPolicy, RegistrationCandidate, SecretPurpose, UserCredential,
};

pub struct PgCredentialStore {
    pool: PgPool,
    policy: PasswordPolicy,
    secret_ttl_seconds: i64,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool, policy: PasswordPolicy, secret_ttl_seconds: i64) -> Self {
        Self {
            pool,
            policy,
            secret_ttl_seconds,
        }
    }

    async fn find_by(&self, column: &'static str, value: &str) -> Result<Option<UserCredential>> {
        // `column` is one of two compile-time constants, never user input.
        let query = match column {
            "login_name" => {
                "SELECT id, login_name, email, first_name, last_name, email_confirmed \
                 FROM users WHERE login_name = $1"
            }
            _ => {
                "SELECT id, login_name, email, first_name, last_name, email_confirmed \
                 FROM users WHERE email = $1"
            }
        };
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up user")?;

        Ok(row.map(|row| UserCredential {
            id: row.get("id"),
            login_name: row.get("login_name"),
            email: row.get("email"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            email_confirmed: row.get("email_confirmed"),
        }))
    }

    async fn generate_secret(&self, user_id: Uuid, purpose: SecretPurpose) -> Result<String> {
        let raw = generate_raw_secret()?;
        let secret_hash = hash_secret(&raw);

        let query = r"
            INSERT INTO action_secrets (user_id, purpose, secret_hash, expires_at)
            VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 second'))
            ON CONFLICT (user_id, purpose)
            DO UPDATE SET secret_hash = EXCLUDED.secret_hash,
                          expires_at = EXCLUDED.expires_at,
                          created_at = NOW()
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .bind(purpose.as_str())
            .bind(&secret_hash)
            .bind(self.secret_ttl_seconds)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to store action secret")?;

        Ok(raw)
    }

    /// Delete the matching live secret inside `tx`. Returns false when the
    /// secret is absent, expired, or already consumed by a concurrent call.
    async fn delete_matching_secret(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: Uuid,
        purpose: SecretPurpose,
        raw_secret: &str,
    ) -> Result<bool> {
        let query = r"
            DELETE FROM action_secrets
            WHERE user_id = $1
              AND purpose = $2
              AND secret_hash = $3
              AND expires_at > NOW()
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(purpose.as_str())
            .bind(hash_secret(raw_secret))
            .execute(&mut **tx)
            .instrument(span)
            .await
            .context("failed to consume action secret")?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_login(&self, login_name: &str) -> Result<Option<UserCredential>> {
        self.find_by("login_name", login_name).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>> {
        self.find_by("email", email).await
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

        let query = r"
            INSERT INTO users (login_name, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&candidate.login_name)
            .bind(&candidate.email)
            .bind(&candidate.first_name)
            .bind(&candidate.last_name)
            .bind(&password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(CreateOutcome::Created(UserCredential {
                id: row.get("id"),
                login_name: candidate.login_name,
                email: candidate.email,
                first_name: candidate.first_name,
                last_name: candidate.last_name,
                email_confirmed: false,
            })),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Duplicate),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn check_password(&self, user: &UserCredential, password: &str) -> Result<bool> {
        let query = "SELECT password_hash FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(user.id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load password hash")?;

        match row {
            Some(row) => verify_password(password, row.get("password_hash")),
            None => Ok(false),
        }
    }

    async fn generate_confirmation_secret(&self, user: &UserCredential) -> Result<String> {
        self.generate_secret(user.id, SecretPurpose::ConfirmEmail).await
    }

    async fn consume_confirmation_secret(
        &self,
        user: &UserCredential,
        raw_secret: &str,
    ) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin confirmation transaction")?;

        if !Self::delete_matching_secret(&mut tx, user.id, SecretPurpose::ConfirmEmail, raw_secret)
            .await?
        {
            tx.rollback()
                .await
                .context("failed to roll back confirmation transaction")?;
            return Ok(false);
        }

        let query = "UPDATE users SET email_confirmed = TRUE WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user.id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to flip confirmation flag")?;

        tx.commit()
            .await
            .context("failed to commit confirmation transaction")?;
        Ok(true)
    }

    async fn generate_reset_secret(&self, user: &UserCredential) -> Result<String> {
        self.generate_secret(user.id, SecretPurpose::ResetPassword).await
    }

    async fn consume_reset_secret(
        &self,
        user: &UserCredential,
        raw_secret: &str,
        new_password: &str,
    ) -> Result<bool> {
        let password_hash = hash_password(new_password)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin reset transaction")?;

        if !Self::delete_matching_secret(&mut tx, user.id, SecretPurpose::ResetPassword, raw_secret)
            .await?
        {
            tx.rollback()
                .await
                .context("failed to roll back reset transaction")?;
            return Ok(false);
        }

        let query = "UPDATE users SET password_hash = $2 WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user.id)
            .bind(&password_hash)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to replace password hash")?;

        tx.commit()
            .await
            .context("failed to commit reset transaction")?;
        Ok(true)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

//! Orchestration of login, registration, email confirmation, and password
//! recovery.
//!
//! Each operation validates its preconditions against the credential store
//! before mutating anything or issuing tokens. Record mutations always happen
//! before notification dispatch, so a slow or failing email transport can
//! fail the request but never corrupt store state.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::error;

use crate::api::email::{build_action_link, Notification, NotificationSender};
use crate::error::AuthError;
use crate::store::{CreateOutcome, CredentialStore, RegistrationCandidate, UserCredential};
use crate::token::transport;
use crate::token::{SessionClaims, SessionTokenIssuer};

use super::state::AuthConfig;
use super::utils::{normalize, valid_email};

/// A freshly authenticated user together with their session token.
#[derive(Debug)]
pub struct SessionGrant {
    pub user: UserCredential,
    pub token: String,
}

pub struct AuthWorkflow {
    config: AuthConfig,
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn NotificationSender>,
    sessions: SessionTokenIssuer,
}

impl AuthWorkflow {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        signing_key: &SecretString,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        let sessions = SessionTokenIssuer::new(
            signing_key,
            config.token_issuer().to_string(),
            config.session_ttl_days(),
        );
        Self {
            config,
            store,
            notifier,
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Verify a presented session token and return its claims.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.sessions.verify(token)
    }

    /// Authenticate by login name and password and mint a session token.
    pub async fn login(&self, login_name: &str, password: &str) -> Result<SessionGrant, AuthError> {
        let login_name = normalize(login_name);
        let user = self
            .store
            .find_by_login(&login_name)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.email_confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }
        if !self.store.check_password(&user, password).await? {
            return Err(AuthError::BadCredentials);
        }
        let token = self.sessions.issue(&user)?;
        Ok(SessionGrant { user, token })
    }

    /// Create an unconfirmed record and email a confirmation link.
    ///
    /// The login name is the normalized email. If notification dispatch
    /// fails the record is NOT rolled back: the account exists unconfirmed
    /// and the caller is pointed at the resend path.
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let email = normalize(email);
        if !valid_email(&email) {
            let mut errors = crate::store::ValidationErrors::default();
            errors.push("email", "is not a valid email address");
            return Err(AuthError::Validation(errors));
        }
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let candidate = RegistrationCandidate {
            login_name: email.clone(),
            email,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        };
        let user = match self.store.create(candidate, password).await? {
            CreateOutcome::Created(user) => user,
            CreateOutcome::Duplicate => return Err(AuthError::DuplicateEmail),
            CreateOutcome::Invalid(errors) => return Err(AuthError::Validation(errors)),
        };

        let raw_secret = self.store.generate_confirmation_secret(&user).await?;
        self.send_confirmation_link(&user, &raw_secret)
    }

    /// Consume a confirmation token, flipping the record to confirmed.
    pub async fn confirm_email(&self, email: &str, transport_token: &str) -> Result<(), AuthError> {
        let user = self.unconfirmed_user(email).await?;
        let raw_secret = transport::decode_from_transport(transport_token)?;
        if !self
            .store
            .consume_confirmation_secret(&user, &raw_secret)
            .await?
        {
            return Err(AuthError::InvalidOrExpiredToken);
        }
        Ok(())
    }

    /// Mint a fresh confirmation secret and email a new link. The previous
    /// link stops working.
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError> {
        let user = self.unconfirmed_user(email).await?;
        let raw_secret = self.store.generate_confirmation_secret(&user).await?;
        self.send_confirmation_link(&user, &raw_secret)
    }

    /// Start password recovery for a confirmed account.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let user = self.confirmed_user(email).await?;
        let raw_secret = self.store.generate_reset_secret(&user).await?;
        self.send_reset_link(&user, &raw_secret)
    }

    /// Consume a reset token and replace the password in one atomic step.
    pub async fn reset_password(
        &self,
        email: &str,
        transport_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.confirmed_user(email).await?;
        // Policy failures are reported before any token is consumed so a bad
        // password choice does not burn the reset link.
        let errors = self.config.password_policy().validate(new_password);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        let raw_secret = transport::decode_from_transport(transport_token)?;
        if !self
            .store
            .consume_reset_secret(&user, &raw_secret, new_password)
            .await?
        {
            return Err(AuthError::InvalidOrExpiredToken);
        }
        Ok(())
    }

    /// Re-issue a session token for the holder of a still-valid one.
    pub async fn refresh(&self, token: &str) -> Result<SessionGrant, AuthError> {
        let claims = self.sessions.verify(token)?;
        // Claims may be days old; reload the record so the fresh token
        // carries current names.
        let user = self
            .store
            .find_by_email(&claims.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let token = self.sessions.issue(&user)?;
        Ok(SessionGrant { user, token })
    }

    async fn unconfirmed_user(&self, email: &str) -> Result<UserCredential, AuthError> {
        let email = normalize(email);
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.email_confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }
        Ok(user)
    }

    async fn confirmed_user(&self, email: &str) -> Result<UserCredential, AuthError> {
        let email = normalize(email);
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.email_confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }
        Ok(user)
    }

    fn send_confirmation_link(
        &self,
        user: &UserCredential,
        raw_secret: &str,
    ) -> Result<(), AuthError> {
        let link = self.action_link(self.config.confirm_email_path(), raw_secret, &user.email);
        self.dispatch(Notification {
            to_email: user.email.clone(),
            subject: "Confirm your email".to_string(),
            body: format!("Follow this link to confirm your email address: {link}"),
        })
    }

    fn send_reset_link(&self, user: &UserCredential, raw_secret: &str) -> Result<(), AuthError> {
        let link = self.action_link(self.config.reset_password_path(), raw_secret, &user.email);
        self.dispatch(Notification {
            to_email: user.email.clone(),
            subject: "Reset your password".to_string(),
            body: format!("Follow this link to reset your password: {link}"),
        })
    }

    fn action_link(&self, path: &str, raw_secret: &str, email: &str) -> String {
        let token = transport::encode_for_transport(raw_secret);
        build_action_link(self.config.client_base_url(), path, &token, email)
    }

    fn dispatch(&self, notification: Notification) -> Result<(), AuthError> {
        self.notifier.send(&notification).map_err(|err| {
            error!("Failed to deliver notification: {err:#}");
            AuthError::NotificationDeliveryFailed
        })
    }
}

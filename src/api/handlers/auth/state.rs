//! Auth configuration: link construction, token lifetimes, and the password
//! policy. Built once at startup and read-only afterwards.

use crate::store::PasswordPolicy;

const DEFAULT_CONFIRM_EMAIL_PATH: &str = "confirm-email";
const DEFAULT_RESET_PASSWORD_PATH: &str = "reset-password";
const DEFAULT_TOKEN_ISSUER: &str = "ingresso";
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
const DEFAULT_ACTION_SECRET_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    client_base_url: String,
    confirm_email_path: String,
    reset_password_path: String,
    token_issuer: String,
    session_ttl_days: i64,
    action_secret_ttl_seconds: i64,
    password_policy: PasswordPolicy,
}

impl AuthConfig {
    #[must_use]
    pub fn new(client_base_url: String) -> Self {
        Self {
            client_base_url,
            confirm_email_path: DEFAULT_CONFIRM_EMAIL_PATH.to_string(),
            reset_password_path: DEFAULT_RESET_PASSWORD_PATH.to_string(),
            token_issuer: DEFAULT_TOKEN_ISSUER.to_string(),
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            action_secret_ttl_seconds: DEFAULT_ACTION_SECRET_TTL_SECONDS,
            password_policy: PasswordPolicy::new(),
        }
    }

    #[must_use]
    pub fn with_confirm_email_path(mut self, path: String) -> Self {
        self.confirm_email_path = path;
        self
    }

    #[must_use]
    pub fn with_reset_password_path(mut self, path: String) -> Self {
        self.reset_password_path = path;
        self
    }

    #[must_use]
    pub fn with_token_issuer(mut self, issuer: String) -> Self {
        self.token_issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_session_ttl_days(mut self, days: i64) -> Self {
        self.session_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_action_secret_ttl_seconds(mut self, seconds: i64) -> Self {
        self.action_secret_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    #[must_use]
    pub fn client_base_url(&self) -> &str {
        &self.client_base_url
    }

    #[must_use]
    pub fn confirm_email_path(&self) -> &str {
        &self.confirm_email_path
    }

    #[must_use]
    pub fn reset_password_path(&self) -> &str {
        &self.reset_password_path
    }

    #[must_use]
    pub fn token_issuer(&self) -> &str {
        &self.token_issuer
    }

    #[must_use]
    pub fn session_ttl_days(&self) -> i64 {
        self.session_ttl_days
    }

    #[must_use]
    pub fn action_secret_ttl_seconds(&self) -> i64 {
        self.action_secret_ttl_seconds
    }

    #[must_use]
    pub fn password_policy(&self) -> PasswordPolicy {
        self.password_policy
    }
}

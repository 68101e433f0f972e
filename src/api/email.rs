//! Email notification delivery abstraction.
//!
//! The workflow renders a confirmation or reset link, wraps it in a
//! [`Notification`], and hands it to a [`NotificationSender`]. The sender
//! decides how to deliver (SMTP, API, etc.) and returns `Ok`/`Err`; the
//! workflow never retries, and a failed dispatch never rolls back the record
//! mutation that preceded it.
//!
//! The default sender for local dev is [`LogNotificationSender`], which logs
//! the payload and returns `Ok(())`.

use anyhow::Result;
use tracing::info;

#[derive(Clone, Debug)]
pub struct Notification {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Delivery abstraction invoked by the auth workflow.
pub trait NotificationSender: Send + Sync {
    /// Deliver a message or return an error to signal failed dispatch.
    fn send(&self, notification: &Notification) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogNotificationSender;

impl NotificationSender for LogNotificationSender {
    fn send(&self, notification: &Notification) -> Result<()> {
        info!(
            to_email = %notification.to_email,
            subject = %notification.subject,
            body = %notification.body,
            "notification send stub"
        );
        Ok(())
    }
}

/// Build the client-side link included in outbound emails.
///
/// Shape: `{base}/{path}?token={transport token}&email={email}`. The token is
/// already transport-encoded (base64url), so it needs no further escaping.
#[must_use]
pub fn build_action_link(client_base_url: &str, path: &str, token: &str, email: &str) -> String {
    let base = client_base_url.trim_end_matches('/');
    format!("{base}/{path}?token={token}&email={email}")
}

//! Domain error taxonomy shared by the token engine, stores, and handlers.
//!
//! Every variant is an expected failure recovered at the HTTP boundary;
//! only `Internal` maps to a 500 and its details stay server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;

use crate::store::ValidationErrors;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user not found")]
    UserNotFound,
    #[error("email not confirmed")]
    EmailNotConfirmed,
    #[error("email already confirmed")]
    AlreadyConfirmed,
    #[error("bad credentials")]
    BadCredentials,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("malformed token")]
    MalformedToken,
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("invalid session token")]
    InvalidToken,
    #[error("notification delivery failed")]
    NotificationDeliveryFailed,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// HTTP status for the variant: 401 for identity problems, 400 for
    /// malformed input or token problems, 500 for internal failures.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound
            | Self::EmailNotConfirmed
            | Self::BadCredentials
            | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::AlreadyConfirmed
            | Self::DuplicateEmail
            | Self::Validation(_)
            | Self::MalformedToken
            | Self::InvalidOrExpiredToken
            | Self::NotificationDeliveryFailed => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::UserNotFound => "Unknown email",
            Self::EmailNotConfirmed => "Email address has not been confirmed",
            Self::AlreadyConfirmed => "Email address is already confirmed",
            Self::BadCredentials => "Incorrect username or password",
            Self::DuplicateEmail => "Email address is already registered",
            Self::Validation(_) => "Validation failed",
            Self::MalformedToken => "Malformed token",
            Self::InvalidOrExpiredToken => "Invalid or expired token",
            Self::InvalidToken => "Invalid session token",
            Self::NotificationDeliveryFailed => {
                "Could not deliver the email, request a new link"
            }
            Self::Internal(_) => "Internal error",
        }
    }
}

impl IntoResponse for AuthError {
    /// Maps workflow failures into stable HTTP responses.
    /// Internal errors are logged server-side and never leak details.
    fn into_response(self) -> Response {
        match self {
            Self::Internal(err) => {
                error!("Internal auth failure: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Validation(fields) => (StatusCode::BAD_REQUEST, Json(fields)).into_response(),
            other => (other.status(), other.public_message()).into_response(),
        }
    }
}

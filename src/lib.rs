//! # Ingresso (Credential Issuance & Account Recovery)
//!
//! `ingresso` manages password credentials and the account lifecycle around
//! them: registration, email confirmation, login, and password recovery.
//!
//! ## Sessions
//!
//! Successful logins mint an `HS512`-signed session token carrying the user's
//! identity claims. Tokens are stateless; verification checks only the
//! signature, expiry, and issuer.
//!
//! ## Action links
//!
//! Email confirmation and password reset both flow through single-use action
//! links. The raw secret is sent to the user and only its `SHA-256` digest is
//! stored, scoped per user and purpose. Regenerating a link invalidates the
//! previous one, and consuming a link is atomic with the account mutation it
//! authorizes.
//!
//! ## Enumeration
//!
//! Login failures for unknown users and wrong passwords are distinct errors
//! internally but collapse to the same `401` response, so the API does not
//! reveal which accounts exist.

pub mod api;
pub mod cli;
pub mod error;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

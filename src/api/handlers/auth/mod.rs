//! Auth handlers and the workflow behind them.
//!
//! The credential record follows a one-way state machine: `Unconfirmed ->
//! Confirmed`, driven only by successful confirmation-secret consumption.
//! The password hash is orthogonal mutable state, replaceable any number of
//! times once confirmed.
//!
//! Login rejections for unknown users and wrong passwords share one public
//! message to prevent account enumeration; the kinds stay distinct in the
//! logs.

pub(crate) mod confirmation;
pub(crate) mod login;
pub(crate) mod recovery;
pub(crate) mod register;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;
mod workflow;

pub use state::AuthConfig;
pub use workflow::{AuthWorkflow, SessionGrant};

//! Token engine: signed session tokens and the transport codec for
//! single-use action secrets.

pub mod session;
pub mod transport;

pub use session::{SessionClaims, SessionTokenIssuer};

//! API handlers for Ingresso.

pub mod auth;
pub mod health;
pub mod root;

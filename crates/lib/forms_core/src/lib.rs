//! # forms_core
//!
//! Core domain and authentication logic for Forms Anyware.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod settings;
pub mod users;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

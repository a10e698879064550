//! Domain models.
//!
//! These are internal domain models, distinct from the API request and
//! response bodies in `forms_api::models`.

pub mod auth;
pub mod role;
pub mod user;

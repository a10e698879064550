//! Request-independent service logic behind the handlers.

pub mod auth;

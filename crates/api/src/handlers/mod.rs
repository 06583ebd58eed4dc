//! Request handlers.
//!
//! Handlers delegate to the services on [`crate::state::AppState`] and map
//! failures via [`crate::error::AppError`].

pub mod auth;
pub mod users;

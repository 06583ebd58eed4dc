//! Gatehouse API server library.
//!
//! Exposes the building blocks (config, state, services, middleware, routes)
//! so the integration tests and the binary entrypoint share one router.

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod services;
pub mod state;

pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users                  sign up (public)
/// /users/me               current user (requires session)
///
/// /signin                 sign in (public)
/// /signout                sign out (public, idempotent)
/// /forgot-password        request reset link (public, always 202)
/// /reset-password         redeem reset token (public)
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new().merge(auth::router()).merge(users::router())
}

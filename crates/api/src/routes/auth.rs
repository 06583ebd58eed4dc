use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Sign-in, sign-out, and password recovery routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", post(auth::signin))
        .route("/signout", post(auth::signout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
}

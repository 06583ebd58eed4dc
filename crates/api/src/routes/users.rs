use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::handlers::{auth, users};
use crate::middleware::identity::require_user;
use crate::state::AppState;

/// Account routes. `/users/me` sits behind the identity gate.
pub fn router() -> Router<AppState> {
    let gated = Router::new()
        .route("/users/me", get(users::me))
        .route_layer(middleware::from_fn(require_user));

    Router::new()
        .route("/users", post(auth::signup))
        .merge(gated)
}

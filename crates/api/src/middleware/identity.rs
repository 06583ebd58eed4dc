//! Identity attach and require.
//!
//! [`attach_identity`] is the only place a request's session is looked up.
//! It must run before [`require_user`] and [`RequireUser`], which only read
//! the [`CurrentUser`] extension it leaves behind.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use gatehouse_core::error::ErrorKind;
use gatehouse_db::models::user::User;

use crate::auth::cookies::session_token_from_headers;
use crate::state::AppState;

/// Where anonymous requests to gated routes are sent.
pub const SIGN_IN_PATH: &str = "/signin";

/// The user resolved from the request's session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the session cookie, if any, and attach the owner to the request.
///
/// A missing cookie, a malformed token, and an unknown token all continue
/// anonymously. Store faults are logged and also continue anonymously.
pub async fn attach_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(presented) = session_token_from_headers(request.headers()) {
        match state.sessions.resolve(&presented).await {
            Ok(user) => {
                tracing::debug!(user_id = user.id, "Session resolved");
                request.extensions_mut().insert(CurrentUser(user));
            }
            Err(err) if err.kind() == ErrorKind::Internal => {
                tracing::error!(error = %err, "Session lookup failed, continuing anonymously");
            }
            Err(err) => {
                tracing::debug!(kind = ?err.kind(), "Presented session not accepted");
            }
        }
    }
    next.run(request).await
}

/// Route layer rejecting requests without an attached identity.
pub async fn require_user(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_none() {
        return Redirect::to(SIGN_IN_PATH).into_response();
    }
    next.run(request).await
}

/// The attached user, or a redirect to the sign-in page.
///
/// ```ignore
/// async fn profile(RequireUser(user): RequireUser) -> Json<UserResponse> {
///     Json(UserResponse::from(&user))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for RequireUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| RequireUser(current.0.clone()))
            .ok_or_else(|| Redirect::to(SIGN_IN_PATH))
    }
}

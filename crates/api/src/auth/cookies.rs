//! The `session` cookie: issuing, clearing, and reading it back.
//!
//! The cookie carries the hex transport form of a session token. It is always
//! `HttpOnly`, scoped to `/`, `SameSite=Lax`, and `Secure` when the deployment
//! says so. Clearing reissues the cookie with an empty value and `Max-Age=0`.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use cookie::{Cookie, SameSite};

use crate::error::{AppError, AppResult};

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "session";

fn base_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(token_hex: String, secure: bool) -> Cookie<'static> {
    base_cookie(token_hex, secure)
}

/// Cookie that tells the browser to drop the session immediately.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(String::new(), secure);
    cookie.make_removal();
    cookie
}

/// Render a cookie as a `Set-Cookie` response header part.
pub fn set_cookie_header(cookie: &Cookie<'_>) -> AppResult<[(HeaderName, HeaderValue); 1]> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::InternalError(format!("Invalid Set-Cookie value: {e}")))?;
    Ok([(SET_COOKIE, value)])
}

/// Extract the session token text from the request's `Cookie` headers.
///
/// Unparseable cookie pairs are skipped. An empty value counts as absent.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

//! Handlers for account entry and recovery (signup, sign-in, sign-out,
//! forgot password, reset password).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use gatehouse_core::email::Email;
use gatehouse_db::models::user::UserResponse;
use serde::Deserialize;

use crate::auth::cookies::{
    clear_session_cookie, session_cookie, session_token_from_headers, set_cookie_header,
};
use crate::auth::password::validate_new_password;
use crate::error::AppResult;
use crate::response::{DataResponse, MessageResponse};
use crate::services::AuthError;
use crate::state::AppState;

/// Answer to every well-formed forgot-password request, known email or not.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, a password reset link has been sent";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Request body for `POST /signin`.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /forgot-password`.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for `POST /reset-password`. `token` is the hex value from
/// the emailed link.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /users
///
/// Create an account and sign it in.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    // 1. Create the account.
    let user = state
        .users
        .signup(&input.email, &input.password, &input.password_confirmation)
        .await?;

    // 2. Issue its first session.
    let session = state.sessions.create(user.id).await?;
    let cookie = session_cookie(session.token.to_hex(), state.config.cookie_secure);

    Ok((
        StatusCode::CREATED,
        set_cookie_header(&cookie)?,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /signin
///
/// Authenticate with email + password and replace any existing session.
pub async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SigninRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.authenticate(&input.email, &input.password).await?;

    let session = state.sessions.create(user.id).await?;
    let cookie = session_cookie(session.token.to_hex(), state.config.cookie_secure);

    Ok((
        set_cookie_header(&cookie)?,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /signout
///
/// Revoke the presented session, if any, and clear the cookie. Signing out
/// without a session (or with a garbled cookie) still succeeds.
pub async fn signout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    if let Some(presented) = session_token_from_headers(&headers) {
        match state.sessions.revoke(&presented).await {
            Ok(()) | Err(AuthError::MalformedToken(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    let cookie = clear_session_cookie(state.config.cookie_secure);
    Ok((StatusCode::NO_CONTENT, set_cookie_header(&cookie)?))
}

/// POST /forgot-password
///
/// Always answers 202 with [`FORGOT_PASSWORD_MESSAGE`] once the email is
/// well-formed, whether or not an account uses it. Issuing the reset and
/// sending the email both happen in a background task, so the response does
/// the same work for a known and an unknown address.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let email = Email::parse(&input.email)?;

    tokio::spawn(async move {
        let reset = match state.resets.request(&email).await {
            Ok(Some(reset)) => reset,
            Ok(None) => return,
            Err(err) => {
                tracing::error!(error = %err, "Failed to issue password reset");
                return;
            }
        };

        let reset_url = state.config.reset_url(&reset.token.to_hex());
        if let Err(err) = state.email.forgot_password(email.as_str(), &reset_url).await {
            tracing::error!(
                user_id = reset.user_id,
                error = %err,
                "Failed to send password reset email"
            );
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: FORGOT_PASSWORD_MESSAGE,
        }),
    ))
}

/// POST /reset-password
///
/// Redeem a reset token, set the new password, and sign the user in.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    // 1. Reject a bad new password before the one-shot token is spent.
    validate_new_password(&input.password, &input.password_confirmation)?;

    // 2. Redeem the token. Its row is gone after this, whatever the outcome.
    let user = state.resets.consume(&input.token).await?;

    // 3. Replace the password.
    state
        .users
        .update_password(user.id, &input.password, &input.password_confirmation)
        .await?;

    // 4. Sign in with a fresh session, replacing any stolen one.
    let session = state.sessions.create(user.id).await?;
    let cookie = session_cookie(session.token.to_hex(), state.config.cookie_secure);

    Ok((
        set_cookie_header(&cookie)?,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

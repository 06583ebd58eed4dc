use gatehouse_core::error::{CoreError, ErrorKind};
use gatehouse_core::token::TokenError;
use gatehouse_db::StoreError;

/// Failure of a service operation.
///
/// Every variant maps to exactly one [`ErrorKind`]. Handlers decide what to
/// render from [`AuthError::client_message`] alone: `Some` is safe to show,
/// `None` means an internal fault whose detail stays in the logs.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Input rejected before any store access (bad email, short password).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Presented token text is not hex or is shorter than the minimum.
    #[error("Malformed token: {0}")]
    MalformedToken(#[source] TokenError),

    /// No credential or account matches.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A reset token was found past its deadline. The row is gone regardless.
    #[error("Password reset token has expired")]
    Expired,

    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email is already registered")]
    EmailTaken,

    /// The owning user disappeared between lookup and write.
    #[error("User no longer exists")]
    UnknownUser,

    /// The randomness source failed while generating a token.
    #[error("Token generation failed: {0}")]
    TokenGeneration(#[source] TokenError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Any store failure the service did not translate itself.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Core(core) => core.kind(),
            AuthError::MalformedToken(_) => ErrorKind::Validation,
            AuthError::NotFound(_) | AuthError::UnknownUser => ErrorKind::NotFound,
            AuthError::Expired => ErrorKind::Expired,
            AuthError::InvalidCredentials => ErrorKind::Unauthorized,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::TokenGeneration(_) | AuthError::PasswordHash(_) => ErrorKind::Internal,
            AuthError::Store(store) => match store {
                StoreError::NotFound | StoreError::MissingReference { .. } => ErrorKind::NotFound,
                StoreError::Duplicate { .. } => ErrorKind::Conflict,
                StoreError::CheckViolation { .. }
                | StoreError::Timeout(_)
                | StoreError::Database(_) => ErrorKind::Internal,
            },
        }
    }

    /// Message safe to render to the end user, or `None` for internal faults.
    pub fn client_message(&self) -> Option<String> {
        if !self.kind().is_client_error() {
            return None;
        }
        let message = match self {
            AuthError::Core(CoreError::Validation(msg)) => msg.clone(),
            AuthError::MalformedToken(_) => "The token is malformed".to_string(),
            AuthError::Store(StoreError::Duplicate { .. }) => "Record already exists".to_string(),
            AuthError::Store(_) => "Record not found".to_string(),
            other => other.to_string(),
        };
        Some(message)
    }
}

/// Translate a lookup miss into the service-level not-found for `entity`.
pub(crate) fn not_found_as(entity: &'static str) -> impl Fn(StoreError) -> AuthError {
    move |err| match err {
        StoreError::NotFound => AuthError::NotFound(entity),
        other => AuthError::Store(other),
    }
}

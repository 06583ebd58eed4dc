/// Closed classification of every failure the services can report.
///
/// Handlers pick a response from the kind alone; they never inspect the
/// internal error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client-correctable input problem (malformed token, bad email, mismatch).
    Validation,
    /// The referenced credential or account does not exist.
    NotFound,
    /// A reset token was found but its deadline has passed.
    Expired,
    /// A uniqueness rule would be violated (e.g. email already registered).
    Conflict,
    /// Credentials were presented but do not authenticate anyone.
    Unauthorized,
    /// Server-side fault; details are logged, never shown to the client.
    Internal,
}

impl ErrorKind {
    /// Whether errors of this kind carry a message that is safe to render.
    pub fn is_client_error(self) -> bool {
        !matches!(self, ErrorKind::Internal)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_internal_is_hidden_from_clients() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::NotFound,
            ErrorKind::Expired,
            ErrorKind::Conflict,
            ErrorKind::Unauthorized,
        ] {
            assert!(kind.is_client_error(), "{kind:?} should be client-visible");
        }
        assert!(!ErrorKind::Internal.is_client_error());
    }

    #[test]
    fn core_error_kinds() {
        assert_eq!(
            CoreError::Validation("bad".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(CoreError::Internal("boom".into()).kind(), ErrorKind::Internal);
    }
}

//! Session lifecycle: create, resolve, revoke.
//!
//! A user holds at most one live session. Creating another overwrites the
//! stored digest in a single upsert, which invalidates the previous token
//! without a separate delete.

use gatehouse_core::token::{clamp_size, Token};
use gatehouse_core::types::{DbId, Timestamp};
use gatehouse_db::models::user::User;
use gatehouse_db::{PgStore, SessionStore, StoreError};

use super::error::{not_found_as, AuthError};

/// A freshly created session. The only place the plaintext token exists.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct SessionService<S = PgStore> {
    store: S,
    token_bytes: usize,
}

impl<S: SessionStore> SessionService<S> {
    /// `token_bytes` is raised to the minimum token size if below it.
    pub fn new(store: S, token_bytes: usize) -> Self {
        Self {
            store,
            token_bytes: clamp_size(token_bytes),
        }
    }

    /// Issue a new session token for `user_id`, replacing any previous one.
    pub async fn create(&self, user_id: DbId) -> Result<Session, AuthError> {
        let token = Token::generate(self.token_bytes).map_err(AuthError::TokenGeneration)?;

        let row = self
            .store
            .upsert_session(user_id, &token.hash())
            .await
            .map_err(|err| match err {
                StoreError::MissingReference { .. } => AuthError::UnknownUser,
                other => AuthError::Store(other),
            })?;

        tracing::info!(
            user_id,
            session_id = row.id,
            replaced = row.updated_at.is_some(),
            "Session issued"
        );

        Ok(Session {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            token,
        })
    }

    /// Resolve the user owning a presented session token.
    ///
    /// Malformed text is [`AuthError::MalformedToken`]; a well-formed token
    /// nobody holds is [`AuthError::NotFound`]. Store faults pass through.
    pub async fn resolve(&self, presented: &str) -> Result<User, AuthError> {
        let token = Token::from_hex(presented).map_err(AuthError::MalformedToken)?;
        self.store
            .find_session_owner(&token.hash())
            .await
            .map_err(not_found_as("Session"))
    }

    /// Delete the session holding the presented token. Absent is not an error.
    pub async fn revoke(&self, presented: &str) -> Result<(), AuthError> {
        let token = Token::from_hex(presented).map_err(AuthError::MalformedToken)?;
        self.store.delete_session(&token.hash()).await?;
        Ok(())
    }
}

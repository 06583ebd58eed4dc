//! Store traits consumed by the services, and their PostgreSQL implementation.
//!
//! The traits are the seam between the credential lifecycle logic and the
//! database: services are generic over them, [`PgStore`] backs them in
//! production. Every method reports failures as a classified [`StoreError`],
//! and lookups report a missing row as [`StoreError::NotFound`].

use std::future::Future;
use std::time::Duration;

use gatehouse_core::email::Email;
use gatehouse_core::token::TokenHash;
use gatehouse_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::password_reset::{PasswordResetOwner, PasswordResetRow};
use crate::models::session::SessionRow;
use crate::models::user::{CreateUser, User};
use crate::repositories::{PasswordResetRepo, SessionRepo, UserRepo};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Persistence of user accounts.
pub trait UserStore: Send + Sync {
    /// Insert a user. A taken email is [`StoreError::Duplicate`].
    fn create_user(
        &self,
        input: &CreateUser,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    fn find_user_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    /// Replace the password hash. A missing user is [`StoreError::NotFound`].
    fn update_password(
        &self,
        user_id: DbId,
        password_hash: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Persistence of sessions: at most one row per user.
pub trait SessionStore: Send + Sync {
    /// Atomically insert or overwrite the session token of `user_id`.
    fn upsert_session(
        &self,
        user_id: DbId,
        token_hash: &TokenHash,
    ) -> impl Future<Output = Result<SessionRow, StoreError>> + Send;

    /// Resolve the user owning a session token digest.
    fn find_session_owner(
        &self,
        token_hash: &TokenHash,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    /// Delete by digest. Zero rows affected is not an error.
    fn delete_session(
        &self,
        token_hash: &TokenHash,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// Persistence of password resets: at most one pending row per user.
pub trait PasswordResetStore: Send + Sync {
    /// Atomically insert or overwrite token and deadline of `user_id`'s reset.
    fn upsert_reset(
        &self,
        user_id: DbId,
        token_hash: &TokenHash,
        expires_at: Timestamp,
    ) -> impl Future<Output = Result<PasswordResetRow, StoreError>> + Send;

    /// Atomically delete a reset by digest and return it with its owner.
    ///
    /// Expired rows are claimed too. A digest that matches nothing, including
    /// one another caller already claimed, is [`StoreError::NotFound`].
    fn claim_reset(
        &self,
        token_hash: &TokenHash,
    ) -> impl Future<Output = Result<PasswordResetOwner, StoreError>> + Send;
}

/// What a delete expected to touch at most one row actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Nothing matched, e.g. a repeated signout.
    Absent,
    Deleted,
    /// More than one row: a uniqueness constraint was bypassed.
    Multiple(u64),
}

impl DeleteOutcome {
    pub fn from_rows(rows_affected: u64) -> Self {
        match rows_affected {
            0 => Self::Absent,
            1 => Self::Deleted,
            n => Self::Multiple(n),
        }
    }
}

/// Log the outcome of a single-row delete and return its classification.
///
/// The caller's operation succeeds in every case.
pub fn log_delete_outcome(entity: &'static str, rows_affected: u64) -> DeleteOutcome {
    let outcome = DeleteOutcome::from_rows(rows_affected);
    match outcome {
        DeleteOutcome::Absent => tracing::debug!(entity, "Delete matched no row"),
        DeleteOutcome::Deleted => tracing::debug!(entity, "Row deleted"),
        DeleteOutcome::Multiple(n) => {
            tracing::error!(entity, rows_affected = n, "Delete affected more than one row")
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// PostgreSQL-backed store. Cheap to clone (the pool is reference counted).
///
/// Every call runs under `statement_timeout`; an elapsed deadline is reported
/// as [`StoreError::Timeout`], never as a partial result.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.statement_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.statement_timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(StoreError::Timeout(self.statement_timeout))
            }
        }
    }
}

impl UserStore for PgStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        self.with_deadline("create_user", UserRepo::create(&self.pool, input))
            .await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<User, StoreError> {
        self.with_deadline(
            "find_user_by_email",
            UserRepo::find_by_email(&self.pool, email.as_str()),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_password(&self, user_id: DbId, password_hash: &str) -> Result<(), StoreError> {
        let updated = self
            .with_deadline(
                "update_password",
                UserRepo::update_password(&self.pool, user_id, password_hash),
            )
            .await?;
        if updated {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}

impl SessionStore for PgStore {
    async fn upsert_session(
        &self,
        user_id: DbId,
        token_hash: &TokenHash,
    ) -> Result<SessionRow, StoreError> {
        self.with_deadline(
            "upsert_session",
            SessionRepo::upsert(&self.pool, user_id, token_hash.as_bytes()),
        )
        .await
    }

    async fn find_session_owner(&self, token_hash: &TokenHash) -> Result<User, StoreError> {
        self.with_deadline(
            "find_session_owner",
            SessionRepo::find_user_by_token_hash(&self.pool, token_hash.as_bytes()),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_session(&self, token_hash: &TokenHash) -> Result<u64, StoreError> {
        let rows = self
            .with_deadline(
                "delete_session",
                SessionRepo::delete_by_token_hash(&self.pool, token_hash.as_bytes()),
            )
            .await?;
        log_delete_outcome("session", rows);
        Ok(rows)
    }
}

impl PasswordResetStore for PgStore {
    async fn upsert_reset(
        &self,
        user_id: DbId,
        token_hash: &TokenHash,
        expires_at: Timestamp,
    ) -> Result<PasswordResetRow, StoreError> {
        self.with_deadline(
            "upsert_reset",
            PasswordResetRepo::upsert(&self.pool, user_id, token_hash.as_bytes(), expires_at),
        )
        .await
    }

    async fn claim_reset(&self, token_hash: &TokenHash) -> Result<PasswordResetOwner, StoreError> {
        self.with_deadline(
            "claim_reset",
            PasswordResetRepo::claim_by_token_hash(&self.pool, token_hash.as_bytes()),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }
}

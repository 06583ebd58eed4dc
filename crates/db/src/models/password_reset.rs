//! Password-reset row models.

use gatehouse_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::user::User;

/// A `password_resets` row, minus the token digest.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetRow {
    pub id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub user_id: DbId,
    pub expires_at: Timestamp,
}

impl PasswordResetRow {
    /// Whether the reset is unusable at `now`. The deadline itself is exclusive.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// A reset row joined with the user who owns it.
#[derive(Debug, Clone)]
pub struct PasswordResetOwner {
    pub reset: PasswordResetRow,
    pub user: User,
}

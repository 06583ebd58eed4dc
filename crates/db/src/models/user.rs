//! User entity model and DTOs.

use std::fmt;

use gatehouse_core::email::Email;
use gatehouse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

const REDACTED: &str = "********";

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output. `Debug` redacts the hash.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub email: String,
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("email", &self.email)
            .field("password_hash", &REDACTED)
            .finish()
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for creating a new user. The email is already normalized.
#[derive(Debug)]
pub struct CreateUser {
    pub email: Email,
    pub password_hash: String,
}

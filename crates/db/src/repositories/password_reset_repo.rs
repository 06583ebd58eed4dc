//! Repository for the `password_resets` table.

use gatehouse_core::types::{DbId, Timestamp};
use sqlx::{FromRow, PgPool};

use crate::models::password_reset::{PasswordResetOwner, PasswordResetRow};
use crate::models::user::User;

/// Flat join row; split into [`PasswordResetOwner`] after fetching.
#[derive(FromRow)]
struct OwnerRow {
    reset_id: DbId,
    reset_created_at: Timestamp,
    reset_updated_at: Option<Timestamp>,
    expires_at: Timestamp,
    user_id: DbId,
    user_created_at: Timestamp,
    user_updated_at: Option<Timestamp>,
    email: String,
    password_hash: String,
}

impl From<OwnerRow> for PasswordResetOwner {
    fn from(row: OwnerRow) -> Self {
        Self {
            reset: PasswordResetRow {
                id: row.reset_id,
                created_at: row.reset_created_at,
                updated_at: row.reset_updated_at,
                user_id: row.user_id,
                expires_at: row.expires_at,
            },
            user: User {
                id: row.user_id,
                created_at: row.user_created_at,
                updated_at: row.user_updated_at,
                email: row.email,
                password_hash: row.password_hash,
            },
        }
    }
}

/// Provides upsert and atomic claim for password resets.
pub struct PasswordResetRepo;

impl PasswordResetRepo {
    /// Insert the reset for `user_id`, or overwrite token and deadline of the
    /// pending one.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        token_hash: &[u8],
        expires_at: Timestamp,
    ) -> Result<PasswordResetRow, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetRow>(
            "INSERT INTO password_resets (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id)
             DO UPDATE SET token_hash = EXCLUDED.token_hash,
                           expires_at = EXCLUDED.expires_at,
                           updated_at = NOW()
             RETURNING id, created_at, updated_at, user_id, expires_at",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Delete the reset matching `token_hash` and return it with its owner.
    ///
    /// Lookup and delete are one statement: of two concurrent callers
    /// presenting the same digest, exactly one gets the row. Expiry is not
    /// checked here.
    pub async fn claim_by_token_hash(
        pool: &PgPool,
        token_hash: &[u8],
    ) -> Result<Option<PasswordResetOwner>, sqlx::Error> {
        let row = sqlx::query_as::<_, OwnerRow>(
            "DELETE FROM password_resets r
              USING users u
              WHERE r.token_hash = $1
                AND u.id = r.user_id
          RETURNING r.id          AS reset_id,
                    r.created_at  AS reset_created_at,
                    r.updated_at  AS reset_updated_at,
                    r.expires_at,
                    u.id          AS user_id,
                    u.created_at  AS user_created_at,
                    u.updated_at  AS user_updated_at,
                    u.email,
                    u.password_hash",
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(PasswordResetOwner::from))
    }
}

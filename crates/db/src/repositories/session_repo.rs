//! Repository for the `sessions` table.

use gatehouse_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::SessionRow;
use crate::models::user::User;

/// Provides upsert, owner lookup and delete for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert the session for `user_id`, or overwrite the token of the one it
    /// already has. A single statement, so concurrent logins cannot interleave.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        token_hash: &[u8],
    ) -> Result<SessionRow, sqlx::Error> {
        sqlx::query_as::<_, SessionRow>(
            "INSERT INTO sessions (user_id, token_hash)
             VALUES ($1, $2)
             ON CONFLICT (user_id)
             DO UPDATE SET token_hash = EXCLUDED.token_hash,
                           updated_at = NOW()
             RETURNING id, created_at, updated_at, user_id",
        )
        .bind(user_id)
        .bind(token_hash)
        .fetch_one(pool)
        .await
    }

    /// Find the user owning the session with the given token digest.
    pub async fn find_user_by_token_hash(
        pool: &PgPool,
        token_hash: &[u8],
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.created_at, u.updated_at, u.email, u.password_hash
               FROM sessions s
              INNER JOIN users u ON u.id = s.user_id
              WHERE s.token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    /// Delete the session with the given token digest. Returns rows affected.
    pub async fn delete_by_token_hash(pool: &PgPool, token_hash: &[u8]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

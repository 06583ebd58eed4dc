//! Session row model.

use gatehouse_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Identity columns returned by a session upsert.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub user_id: DbId,
}

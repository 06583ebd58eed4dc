//! In-memory store used by the service unit tests.
//!
//! Mirrors the PostgreSQL constraints the services rely on: unique email,
//! one session and one reset per user, foreign keys to users. It also counts
//! calls so tests can assert that a failure happened before any store access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use gatehouse_core::email::Email;
use gatehouse_core::token::TokenHash;
use gatehouse_core::types::{DbId, Timestamp};
use gatehouse_db::models::password_reset::{PasswordResetOwner, PasswordResetRow};
use gatehouse_db::models::session::SessionRow;
use gatehouse_db::models::user::{CreateUser, User};
use gatehouse_db::store::log_delete_outcome;
use gatehouse_db::{PasswordResetStore, SessionStore, StoreError, UserStore};

#[derive(Default)]
struct Tables {
    next_id: DbId,
    users: HashMap<DbId, User>,
    sessions: HashMap<DbId, (SessionRow, TokenHash)>,
    resets: HashMap<DbId, (PasswordResetRow, TokenHash)>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn user_exists(&self, user_id: DbId, constraint: &str) -> Result<(), StoreError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference {
                constraint: constraint.to_string(),
            })
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    calls: Arc<AtomicUsize>,
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent delete (including a reset claim) fail as a
    /// database fault.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn reset_count(&self) -> usize {
        self.tables.lock().unwrap().resets.len()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    /// Insert a user directly, bypassing password rules.
    pub fn seed_user(&self, email: &str, password_hash: &str) -> User {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let user = User {
            id,
            created_at: Utc::now(),
            updated_at: None,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.insert(id, user.clone());
        user
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_delete(&self) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

impl UserStore for MemoryStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        if tables.users.values().any(|u| u.email == input.email.as_str()) {
            return Err(StoreError::Duplicate {
                constraint: "uq_users_email".into(),
            });
        }
        let id = tables.next_id();
        let user = User {
            id,
            created_at: Utc::now(),
            updated_at: None,
            email: input.email.as_str().to_string(),
            password_hash: input.password_hash.clone(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<User, StoreError> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .values()
            .find(|u| u.email == email.as_str())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_password(&self, user_id: DbId, password_hash: &str) -> Result<(), StoreError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Some(Utc::now());
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    async fn upsert_session(
        &self,
        user_id: DbId,
        token_hash: &TokenHash,
    ) -> Result<SessionRow, StoreError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        tables.user_exists(user_id, "fk_sessions_user_id")?;
        let existing = tables.sessions.get(&user_id).map(|(row, _)| row.clone());
        let row = match existing {
            Some(existing) => SessionRow {
                updated_at: Some(Utc::now()),
                ..existing
            },
            None => SessionRow {
                id: tables.next_id(),
                created_at: Utc::now(),
                updated_at: None,
                user_id,
            },
        };
        tables.sessions.insert(user_id, (row.clone(), *token_hash));
        Ok(row)
    }

    async fn find_session_owner(&self, token_hash: &TokenHash) -> Result<User, StoreError> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        tables
            .sessions
            .values()
            .find(|(_, hash)| *hash == *token_hash)
            .and_then(|(row, _)| tables.users.get(&row.user_id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_session(&self, token_hash: &TokenHash) -> Result<u64, StoreError> {
        self.touch();
        self.check_delete()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, (_, hash)| *hash != *token_hash);
        let rows = (before - tables.sessions.len()) as u64;
        log_delete_outcome("session", rows);
        Ok(rows)
    }
}

impl PasswordResetStore for MemoryStore {
    async fn upsert_reset(
        &self,
        user_id: DbId,
        token_hash: &TokenHash,
        expires_at: Timestamp,
    ) -> Result<PasswordResetRow, StoreError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        tables.user_exists(user_id, "fk_password_resets_user_id")?;
        let existing = tables.resets.get(&user_id).map(|(row, _)| row.clone());
        let row = match existing {
            Some(existing) => PasswordResetRow {
                updated_at: Some(Utc::now()),
                expires_at,
                ..existing
            },
            None => PasswordResetRow {
                id: tables.next_id(),
                created_at: Utc::now(),
                updated_at: None,
                user_id,
                expires_at,
            },
        };
        tables.resets.insert(user_id, (row.clone(), *token_hash));
        Ok(row)
    }

    async fn claim_reset(&self, token_hash: &TokenHash) -> Result<PasswordResetOwner, StoreError> {
        self.touch();
        self.check_delete()?;
        let mut tables = self.tables.lock().unwrap();
        let user_id = tables
            .resets
            .iter()
            .find(|(_, (_, hash))| *hash == *token_hash)
            .map(|(user_id, _)| *user_id)
            .ok_or(StoreError::NotFound)?;
        let user = tables.users.get(&user_id).cloned().ok_or(StoreError::NotFound)?;
        let (reset, _) = tables.resets.remove(&user_id).ok_or(StoreError::NotFound)?;
        Ok(PasswordResetOwner { reset, user })
    }
}

//! Password reset lifecycle: request and one-shot consume.
//!
//! A user holds at most one pending reset. Consuming a token claims its row:
//! lookup and delete happen in one atomic store call, so the row is gone
//! whether the token turns out to be valid or expired, and concurrent
//! consumers of the same token cannot both win. Expiry is only checked at
//! consume time; expired rows are never swept in the background.

use chrono::{Duration, Utc};
use gatehouse_core::email::Email;
use gatehouse_core::token::{Token, MIN_TOKEN_BYTES};
use gatehouse_core::types::{DbId, Timestamp};
use gatehouse_db::models::password_reset::PasswordResetOwner;
use gatehouse_db::models::user::User;
use gatehouse_db::{PasswordResetStore, PgStore, StoreError, UserStore};

use super::error::AuthError;

/// A freshly requested reset, holding the plaintext token for the email link.
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub id: DbId,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub expires_at: Timestamp,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct PasswordResetService<S = PgStore> {
    store: S,
    ttl: Duration,
}

impl<S: UserStore + PasswordResetStore> PasswordResetService<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Start a reset for `email`.
    ///
    /// Returns `Ok(None)` when no account uses the address, so callers can
    /// answer exactly as they would for a known one.
    pub async fn request(&self, email: &Email) -> Result<Option<PasswordReset>, AuthError> {
        self.request_at(email, Utc::now()).await
    }

    pub async fn request_at(
        &self,
        email: &Email,
        now: Timestamp,
    ) -> Result<Option<PasswordReset>, AuthError> {
        let user = match self.store.find_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                tracing::info!("Password reset requested for an unregistered email");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let token = Token::generate(MIN_TOKEN_BYTES).map_err(AuthError::TokenGeneration)?;
        let expires_at = now + self.ttl;

        let row = match self
            .store
            .upsert_reset(user.id, &token.hash(), expires_at)
            .await
        {
            Ok(row) => row,
            // The account was deleted after the lookup.
            Err(StoreError::MissingReference { .. }) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(user_id = user.id, reset_id = row.id, %expires_at, "Password reset issued");

        Ok(Some(PasswordReset {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            token,
        }))
    }

    /// Redeem a presented reset token, returning the account it authorizes.
    pub async fn consume(&self, presented: &str) -> Result<User, AuthError> {
        self.consume_at(presented, Utc::now()).await
    }

    /// Redeem a presented reset token as of `now`.
    ///
    /// The row is claimed (deleted and returned) before anything else is
    /// decided, so every later exit leaves it gone. A failed claim is a server
    /// fault even for an otherwise valid token.
    pub async fn consume_at(&self, presented: &str, now: Timestamp) -> Result<User, AuthError> {
        let token = Token::from_hex(presented).map_err(AuthError::MalformedToken)?;

        let claimed = self.store.claim_reset(&token.hash()).await;
        let PasswordResetOwner { reset, user } = match claimed {
            Ok(owner) => owner,
            Err(StoreError::NotFound) => return Err(AuthError::NotFound("Password reset")),
            Err(err) => {
                tracing::error!(error = %err, "Failed to claim password reset");
                return Err(err.into());
            }
        };

        if reset.is_expired_at(now) {
            tracing::info!(
                reset_id = reset.id,
                user_id = user.id,
                expires_at = %reset.expires_at,
                "Expired password reset presented"
            );
            return Err(AuthError::Expired);
        }

        tracing::info!(reset_id = reset.id, user_id = user.id, "Password reset consumed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::services::memory::MemoryStore;

    fn service() -> (MemoryStore, PasswordResetService<MemoryStore>) {
        let store = MemoryStore::new();
        (
            store.clone(),
            PasswordResetService::new(store, Duration::hours(1)),
        )
    }

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn request_issues_minimum_size_token_with_deadline() {
        let (store, resets) = service();
        let user = store.seed_user("user@example.com", "hash");
        let now = Utc::now();

        let reset = resets
            .request_at(&email("user@example.com"), now)
            .await
            .unwrap()
            .expect("known email yields a reset");

        assert_eq!(reset.user_id, user.id);
        assert!(reset.token.byte_len() >= MIN_TOKEN_BYTES);
        assert_eq!(reset.expires_at, now + Duration::hours(1));
    }

    #[tokio::test]
    async fn unknown_email_is_success_shaped() {
        let (store, resets) = service();
        let outcome = resets.request(&email("nobody@example.com")).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(store.reset_count(), 0);
    }

    #[tokio::test]
    async fn repeated_request_replaces_pending_token() {
        let (store, resets) = service();
        store.seed_user("user@example.com", "hash");

        let first = resets.request(&email("user@example.com")).await.unwrap().unwrap();
        let second = resets.request(&email("user@example.com")).await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.reset_count(), 1);
        assert_matches!(
            resets.consume(&first.token.to_hex()).await,
            Err(AuthError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn consume_is_one_shot() {
        let (store, resets) = service();
        let user = store.seed_user("user@example.com", "hash");
        let reset = resets.request(&email("user@example.com")).await.unwrap().unwrap();
        let presented = reset.token.to_hex();

        let owner = resets.consume(&presented).await.unwrap();
        assert_eq!(owner.id, user.id);
        assert_eq!(store.reset_count(), 0);

        assert_matches!(resets.consume(&presented).await, Err(AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn consume_one_second_before_deadline_succeeds() {
        let (store, resets) = service();
        store.seed_user("user@example.com", "hash");
        let reset = resets.request(&email("user@example.com")).await.unwrap().unwrap();

        let at = reset.expires_at - Duration::seconds(1);
        assert!(resets.consume_at(&reset.token.to_hex(), at).await.is_ok());
        assert_eq!(store.reset_count(), 0);
    }

    #[tokio::test]
    async fn consume_one_second_after_deadline_is_expired_and_deleted() {
        let (store, resets) = service();
        store.seed_user("user@example.com", "hash");
        let reset = resets.request(&email("user@example.com")).await.unwrap().unwrap();
        let presented = reset.token.to_hex();

        let at = reset.expires_at + Duration::seconds(1);
        assert_matches!(resets.consume_at(&presented, at).await, Err(AuthError::Expired));
        assert_eq!(store.reset_count(), 0);

        assert_matches!(
            resets.consume_at(&presented, at).await,
            Err(AuthError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn consume_at_exact_deadline_is_expired() {
        let (store, resets) = service();
        store.seed_user("user@example.com", "hash");
        let reset = resets.request(&email("user@example.com")).await.unwrap().unwrap();

        assert_matches!(
            resets.consume_at(&reset.token.to_hex(), reset.expires_at).await,
            Err(AuthError::Expired)
        );
    }

    #[tokio::test]
    async fn failed_claim_is_a_server_fault_even_for_valid_token() {
        let (store, resets) = service();
        store.seed_user("user@example.com", "hash");
        let reset = resets.request(&email("user@example.com")).await.unwrap().unwrap();
        store.fail_deletes();

        let err = resets.consume(&reset.token.to_hex()).await.unwrap_err();
        assert_matches!(err, AuthError::Store(StoreError::Database(_)));
        assert_eq!(err.client_message(), None);
    }

    /// Yields to the scheduler before every call, so joined futures interleave.
    #[derive(Clone)]
    struct YieldingStore(MemoryStore);

    impl UserStore for YieldingStore {
        async fn create_user(
            &self,
            input: &gatehouse_db::models::user::CreateUser,
        ) -> Result<User, StoreError> {
            tokio::task::yield_now().await;
            self.0.create_user(input).await
        }

        async fn find_user_by_email(&self, email: &Email) -> Result<User, StoreError> {
            tokio::task::yield_now().await;
            self.0.find_user_by_email(email).await
        }

        async fn update_password(&self, user_id: DbId, hash: &str) -> Result<(), StoreError> {
            tokio::task::yield_now().await;
            self.0.update_password(user_id, hash).await
        }
    }

    impl PasswordResetStore for YieldingStore {
        async fn upsert_reset(
            &self,
            user_id: DbId,
            token_hash: &gatehouse_core::token::TokenHash,
            expires_at: Timestamp,
        ) -> Result<gatehouse_db::models::password_reset::PasswordResetRow, StoreError> {
            tokio::task::yield_now().await;
            self.0.upsert_reset(user_id, token_hash, expires_at).await
        }

        async fn claim_reset(
            &self,
            token_hash: &gatehouse_core::token::TokenHash,
        ) -> Result<PasswordResetOwner, StoreError> {
            tokio::task::yield_now().await;
            let claimed = self.0.claim_reset(token_hash).await;
            tokio::task::yield_now().await;
            claimed
        }
    }

    #[tokio::test]
    async fn concurrent_consumes_authorize_one_change() {
        let store = MemoryStore::new();
        let user = store.seed_user("user@example.com", "hash");
        let resets = PasswordResetService::new(YieldingStore(store.clone()), Duration::hours(1));
        let reset = resets.request(&email("user@example.com")).await.unwrap().unwrap();
        let presented = reset.token.to_hex();

        let (first, second) = tokio::join!(resets.consume(&presented), resets.consume(&presented));

        let winners: Vec<_> = [&first, &second]
            .into_iter()
            .filter_map(|r| r.as_ref().ok())
            .collect();
        assert_eq!(winners.len(), 1, "one token, one password change");
        assert_eq!(winners[0].id, user.id);
        assert!(
            matches!(first, Err(AuthError::NotFound(_)))
                || matches!(second, Err(AuthError::NotFound(_)))
        );
        assert_eq!(store.reset_count(), 0);
    }

    #[tokio::test]
    async fn malformed_token_is_validation_not_lookup() {
        let (store, resets) = service();
        assert_matches!(resets.consume("zz").await, Err(AuthError::MalformedToken(_)));
        assert_eq!(store.calls(), 0);
    }
}

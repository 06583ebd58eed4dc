//! Account creation, password sign-in, and password replacement.

use gatehouse_core::email::Email;
use gatehouse_core::types::DbId;
use gatehouse_db::models::user::{CreateUser, User};
use gatehouse_db::{PgStore, StoreError, UserStore};

use super::error::AuthError;
use crate::auth::password::{
    hash_password, validate_new_password, verify_dummy, verify_password,
};

#[derive(Debug, Clone)]
pub struct UserService<S = PgStore> {
    store: S,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a new account.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_new_password(password, confirmation)?;
        let password_hash = hash(password)?;

        let user = self
            .store
            .create_user(&CreateUser {
                email,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                StoreError::Duplicate { .. } => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check an email/password pair.
    ///
    /// An unparseable or unknown email and a wrong password all produce the
    /// same [`AuthError::InvalidCredentials`], after the same hashing work.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Ok(email) = Email::parse(email) else {
            verify_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };

        let user = match self.store.find_user_by_email(&email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                verify_dummy(password);
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(err.into()),
        };

        let valid = verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        if !valid {
            tracing::info!(user_id = user.id, "Sign-in rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn update_password(
        &self,
        user_id: DbId,
        password: &str,
        confirmation: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(password, confirmation)?;
        let password_hash = hash(password)?;

        self.store
            .update_password(user_id, &password_hash)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => AuthError::UnknownUser,
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id, "Password updated");
        Ok(())
    }
}

fn hash(password: &str) -> Result<String, AuthError> {
    hash_password(password).map_err(|e| AuthError::PasswordHash(e.to_string()))
}

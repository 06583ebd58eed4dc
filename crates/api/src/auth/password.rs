//! Argon2id password hashing, verification, and input rules.
//!
//! Hashes use Argon2id (not bcrypt) with the crate's fixed default parameters
//! and a random salt from [`OsRng`], stored as a PHC string so the parameters
//! travel with the hash. A mismatching password is `Ok(false)`, never an
//! error: only a corrupt stored hash or a primitive failure is a server fault.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::LazyLock;

use argon2::Argon2;
use gatehouse_core::error::CoreError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a plaintext password, returning the PHC-formatted string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Compare a plaintext password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Hash with the same parameters as real accounts, verified against when no
/// account matches so a miss costs as much as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("gatehouse-dummy-password").ok());

/// Run a full verification against a throwaway hash and discard the result.
pub fn verify_dummy(password: &str) {
    match DUMMY_HASH.as_deref() {
        Some(hash) => {
            let _ = verify_password(password, hash);
        }
        None => tracing::error!("Failed to prepare dummy password hash"),
    }
}

/// Check a new password and its confirmation before hashing.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), CoreError> {
    if password.is_empty() {
        return Err(CoreError::Validation("Password is required".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if password != confirmation {
        return Err(CoreError::Validation(
            "Password confirmation does not match".into(),
        ));
    }
    Ok(())
}

//! Credential lifecycle services.
//!
//! Each service is generic over the store traits it needs and defaults to
//! [`gatehouse_db::PgStore`]. Handlers only see [`AuthError`] and decide what
//! to render from its kind.

pub mod error;
pub mod password_reset;
pub mod session;
pub mod user;

#[cfg(test)]
mod memory;

pub use error::AuthError;
pub use password_reset::{PasswordReset, PasswordResetService};
pub use session::{Session, SessionService};
pub use user::UserService;

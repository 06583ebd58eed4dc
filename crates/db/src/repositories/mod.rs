//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. sqlx prepares and caches every statement
//! per connection, so repeated calls reuse the server-side prepared plan.

pub mod password_reset_repo;
pub mod session_repo;
pub mod user_repo;

pub use password_reset_repo::PasswordResetRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;

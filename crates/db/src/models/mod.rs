//! Row structs and DTOs.
//!
//! Credential rows never carry the token digest back out of the store: the
//! digest is only ever an input (bind parameter) to a query.

pub mod password_reset;
pub mod session;
pub mod user;

//! Domain primitives shared by the store and the HTTP layer.
//!
//! - [`token`] -- opaque bearer tokens, their SHA-512 digests, and generation.
//! - [`email`] -- normalized email addresses.
//! - [`error`] -- domain error and the closed error-kind enumeration.
//! - [`types`] -- id and timestamp aliases.

pub mod email;
pub mod error;
pub mod token;
pub mod types;

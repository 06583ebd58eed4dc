//! Request identity middleware.
//!
//! - [`identity::attach_identity`] -- resolves the `session` cookie into a
//!   [`identity::CurrentUser`] request extension. Never rejects.
//! - [`identity::require_user`] -- route layer redirecting anonymous requests
//!   to the sign-in page.
//! - [`identity::RequireUser`] -- extractor handing the attached user to a handler.

pub mod identity;

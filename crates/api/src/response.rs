//! Shared response envelope types for API handlers.
//!
//! Successful bodies use a `{ "data": ... }` envelope; errors use
//! `{ "error": ..., "code": ... }` (see [`crate::error::AppError`]).

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Body for endpoints that only acknowledge a request.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

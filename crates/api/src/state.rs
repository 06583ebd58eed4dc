use std::sync::Arc;

use gatehouse_db::PgStore;

use crate::config::ServerConfig;
use crate::email::EmailDelivery;
use crate::services::{PasswordResetService, SessionService, UserService};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (the pool is reference counted, the rest is
/// behind `Arc` or small).
#[derive(Clone)]
pub struct AppState {
    /// Store backing every service; also used directly for health checks.
    pub store: PgStore,
    pub config: Arc<ServerConfig>,
    pub users: UserService,
    pub sessions: SessionService,
    pub resets: PasswordResetService,
    pub email: Arc<EmailDelivery>,
}

impl AppState {
    /// Wire the services over one store.
    pub fn new(store: PgStore, config: Arc<ServerConfig>, email: Arc<EmailDelivery>) -> Self {
        Self {
            users: UserService::new(store.clone()),
            sessions: SessionService::new(store.clone(), config.session_token_bytes),
            resets: PasswordResetService::new(store.clone(), config.password_reset_ttl()),
            store,
            config,
            email,
        }
    }
}

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use gatehouse_api::config::ServerConfig;
use gatehouse_api::email::EmailDelivery;
use gatehouse_api::router::build_app_router;
use gatehouse_api::state::AppState;
use gatehouse_db::PgStore;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults and email disabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_statement_timeout_secs: 5,
        session_token_bytes: 32,
        password_reset_ttl_mins: 60,
        cookie_secure: false,
        public_base_url: "http://localhost:3000".to_string(),
        database_url: String::new(),
        email: None,
    }
}

/// Build the full application router, same middleware stack as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let store = PgStore::new(pool, config.statement_timeout());
    let state = AppState::new(store, Arc::new(config), Arc::new(EmailDelivery::disabled()));
    build_app_router(state).expect("test config is valid")
}

/// App over a pool that never connects. Only for requests that must not
/// reach the database.
pub fn build_offline_app() -> Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://gatehouse@127.0.0.1:1/unreachable")
        .expect("lazy pool needs no connection");
    build_test_app(pool)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    cookie: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `name=value` pair of the response's `Set-Cookie`, ready to send back.
pub fn session_cookie_pair(response: &Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("response sets a cookie")
        .to_str()
        .unwrap();
    header.split(';').next().unwrap().trim().to_string()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}

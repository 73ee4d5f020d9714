// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use clippy_server::{
    config::FetchSettings,
    handlers::upstream::build_http_client,
    routes::api_router,
    state::AppState,
    store::{ClipboardStore, MemoryStore},
};

/// Fetch settings for tests: loopback upstreams allowed, short timeouts.
pub fn test_settings() -> FetchSettings {
    FetchSettings {
        preview_timeout: Duration::from_millis(750),
        embed_check_timeout: Duration::from_millis(750),
        preview_max_body_bytes: 64 * 1024,
        block_private_addresses: false,
    }
}

pub fn test_state_with(settings: FetchSettings, store: Arc<dyn ClipboardStore>) -> AppState {
    AppState {
        http_client: build_http_client().expect("client builds"),
        fetch: settings,
        store,
    }
}

/// Build the application router with an empty store.
pub fn create_test_app() -> Router {
    api_router(test_state_with(
        test_settings(),
        Arc::new(MemoryStore::new(100)),
    ))
}

pub fn create_test_app_with(settings: FetchSettings, store: Arc<dyn ClipboardStore>) -> Router {
    api_router(test_state_with(settings, store))
}

/// Serve `router` on an ephemeral loopback port and return its address.
pub async fn spawn_upstream(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

/// An address nothing is listening on.
pub fn closed_port_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn encode(url: &str) -> String {
    urlencoding::encode(url).into_owned()
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn patch_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::PATCH)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn delete(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

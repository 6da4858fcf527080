//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use frps_acl::acl::AclStore;
use frps_acl::config::PluginConfig;
use frps_acl::http::HttpServer;
use frps_acl::storage::{MemoryStore, SectionStore};

/// Router over an arbitrary backend.
pub fn router_with(config: PluginConfig, backend: impl SectionStore + 'static) -> (Router, Arc<AclStore>) {
    let store = Arc::new(AclStore::open(Box::new(backend)).unwrap());
    let server = HttpServer::new(config, store.clone());
    (server.router(), store)
}

/// Router over an in-memory store; the returned handle controls saves.
pub fn memory_router() -> (Router, MemoryStore) {
    let backend = MemoryStore::new();
    let (router, _) = router_with(PluginConfig::default(), backend.clone());
    (router, backend)
}

/// Send one request and decode the JSON body.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

pub async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(body), None).await
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None, None).await
}

/// Post a plugin envelope to `/handler`.
pub async fn plugin(router: &Router, op: &str, content: Value) -> (StatusCode, Value) {
    post(
        router,
        "/handler",
        serde_json::json!({ "version": "0.1.0", "op": op, "content": content }),
    )
    .await
}

pub fn selection(users: &[&str]) -> Value {
    serde_json::json!({
        "users": users.iter().map(|u| serde_json::json!({ "user": u })).collect::<Vec<_>>()
    })
}

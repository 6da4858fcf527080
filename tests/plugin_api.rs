//! Plugin endpoint tests driven through the HTTP router.

use axum::http::{Method, StatusCode};
use serde_json::json;
use std::sync::{mpsc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use frps_acl::config::PluginConfig;
use frps_acl::storage::{SectionDocument, SectionStore, StorageError};

mod common;
use common::{memory_router, plugin, post, router_with, selection, send};

/// Backend whose first save blocks until the test releases it.
struct GatedStore {
    started: Mutex<Option<oneshot::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl SectionStore for GatedStore {
    fn load(&self) -> Result<SectionDocument, StorageError> {
        Ok(SectionDocument::new())
    }

    fn save(&self, _doc: &SectionDocument) -> Result<(), StorageError> {
        if let Some(tx) = self.started.lock().unwrap().take() {
            let _ = tx.send(());
        }
        let _ = self.release.lock().unwrap().recv();
        Ok(())
    }

    fn describe(&self) -> String {
        "gated".to_string()
    }
}

async fn with_alice() -> axum::Router {
    let (router, _) = memory_router();
    let (_, body) = post(
        &router,
        "/add",
        json!({"user": "alice", "token": "tok123", "ports": "8080, 8081"}),
    )
    .await;
    assert_eq!(body["success"], true);
    router
}

#[tokio::test]
async fn test_login_allow_and_deny() {
    let router = with_alice().await;

    let (status, body) = plugin(&router, "Login", json!({"user": "alice", "metas": {"token": "tok123"}})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reject": false, "unchange": true}));

    let (status, body) = plugin(&router, "Login", json!({"user": "alice", "metas": {"token": "nope"}})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reject"], true);
    assert_eq!(body["reject_reason"], "invalid user or meta token");

    // Unknown users get the same answer.
    let (_, unknown) = plugin(&router, "Login", json!({"user": "mallory", "metas": {"token": "tok123"}})).await;
    assert_eq!(unknown, body);
}

#[tokio::test]
async fn test_new_proxy_port_scenario() {
    let router = with_alice().await;
    let proxy = |port: u16| {
        json!({
            "user": {"user": "alice", "metas": {"token": "tok123"}, "run_id": "r1"},
            "proxy_name": "ssh",
            "proxy_type": "tcp",
            "remote_port": port
        })
    };

    let (_, body) = plugin(&router, "NewProxy", proxy(8080)).await;
    assert_eq!(body["reject"], false);

    let (_, body) = plugin(&router, "NewProxy", proxy(9090)).await;
    assert_eq!(body["reject"], true);
    assert_eq!(body["reject_reason"], "user [alice] port [9090] is not allowed");
}

#[tokio::test]
async fn test_disable_then_enable_login() {
    let router = with_alice().await;
    let login = json!({"user": "alice", "metas": {"token": "tok123"}});

    let (_, body) = post(&router, "/disable", selection(&["alice"])).await;
    assert_eq!(body["success"], true);
    let (_, body) = plugin(&router, "Login", login.clone()).await;
    assert_eq!(body["reject"], true);

    for op in ["Ping", "NewWorkConn", "NewUserConn"] {
        let (_, body) = plugin(&router, op, json!({"user": {"user": "alice"}})).await;
        assert_eq!(body["reject"], true, "{}", op);
        assert_eq!(body["reject_reason"], "user [alice] is disabled");
    }

    let (_, body) = post(&router, "/enable", selection(&["alice"])).await;
    assert_eq!(body["success"], true);
    let (_, body) = plugin(&router, "Login", login).await;
    assert_eq!(body["reject"], false);
}

#[tokio::test]
async fn test_unknown_op_is_bad_request() {
    let router = with_alice().await;
    let (status, body) = plugin(&router, "CloseProxy", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "unsupported operation [CloseProxy]");
}

#[tokio::test]
async fn test_malformed_payloads_are_bad_request() {
    let router = with_alice().await;

    let (status, body) = plugin(&router, "NewProxy", json!({"remote_port": "eighty"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["msg"].as_str().unwrap().starts_with("malformed request"));

    // Envelope without an op.
    let (status, _) = post(&router, "/handler", json!({"content": {}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Not JSON at all.
    let (status, _) = send(&router, Method::POST, "/handler", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_runtime_stays_responsive_during_slow_save() {
    let (started_tx, started_rx) = oneshot::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let backend = GatedStore {
        started: Mutex::new(Some(started_tx)),
        release: Mutex::new(release_rx),
    };
    let (router, _) = router_with(PluginConfig::default(), backend);

    let admin = tokio::spawn({
        let router = router.clone();
        async move { post(&router, "/add", json!({"user": "alice", "token": "tok123"})).await }
    });
    started_rx.await.unwrap();

    let ping = tokio::spawn({
        let router = router.clone();
        async move { plugin(&router, "Ping", json!({"user": {"user": "alice"}})).await }
    });

    // The save holds the write lock; the single runtime thread must still run timers.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!ping.is_finished());

    release_tx.send(()).unwrap();
    drop(release_tx);

    let (_, body) = admin.await.unwrap();
    assert_eq!(body["success"], true);
    let (status, body) = ping.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reject"], false);
}

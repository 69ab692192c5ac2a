//! In-memory scripted transport for tests.
//!
//! `ScriptedTransport` satisfies `ArchiveTransport` without any network:
//! each path carries a queue of scripted replies consumed in order, an
//! unscripted path answers 404, and a gate can hold requests open so
//! tests can observe in-flight state deterministically.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::domain::error::{ArchiveError, Result};
use crate::domain::ArticleUpload;
use crate::transport::{ArchiveTransport, JsonResponse};

#[derive(Debug, Clone)]
enum Scripted {
    Reply { status: u16, body: Option<Value> },
    Fail(String),
}

/// One observed request, for assertions about what was (not) called.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Scripted in-memory archive transport.
#[derive(Default)]
pub struct ScriptedTransport {
    gets: Mutex<HashMap<String, VecDeque<Scripted>>>,
    posts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    pdfs: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next reply for a GET of `path`.
    pub fn on_get(&self, path: &str, status: u16, body: Value) {
        self.gets
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted::Reply {
                status,
                body: Some(body),
            });
    }

    /// Script a transport-level failure for the next GET of `path`.
    pub fn on_get_failure(&self, path: &str, reason: &str) {
        self.gets
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted::Fail(reason.to_string()));
    }

    /// Script the next reply for a POST (JSON or upload) to `path`.
    pub fn on_post(&self, path: &str, status: u16, body: Value) {
        self.posts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted::Reply {
                status,
                body: Some(body),
            });
    }

    /// Script a transport-level failure for the next POST to `path`.
    pub fn on_post_failure(&self, path: &str, reason: &str) {
        self.posts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted::Fail(reason.to_string()));
    }

    /// Serve `bytes` for binary POSTs to `path`.
    pub fn on_pdf(&self, path: &str, bytes: Vec<u8>) {
        self.pdfs.lock().unwrap().insert(path.to_string(), bytes);
    }

    /// Hold every subsequent request until `release_gate`.
    pub fn engage_gate(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Release all held and future requests.
    pub fn release_gate(&self) {
        if let Some(sem) = self.gate.lock().unwrap().take() {
            sem.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    /// Every request seen so far, in order.
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// How many times `path` was requested (any method).
    pub fn hits(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(sem) = gate {
            // Permits persist, so a release before we get here still lets
            // us through.
            let _permit = sem.acquire().await;
        }
    }

    fn record(&self, method: &'static str, path: &str, body: Option<Value>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });
    }

    fn take(
        table: &Mutex<HashMap<String, VecDeque<Scripted>>>,
        path: &str,
    ) -> Result<JsonResponse> {
        let scripted = table
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(Scripted::Reply { status, body }) => Ok(JsonResponse { status, body }),
            Some(Scripted::Fail(reason)) => Err(ArchiveError::Transport(reason)),
            None => Ok(JsonResponse {
                status: 404,
                body: None,
            }),
        }
    }
}

#[async_trait]
impl ArchiveTransport for ScriptedTransport {
    async fn get_json(&self, path: &str) -> Result<JsonResponse> {
        self.record("GET", path, None);
        self.wait_gate().await;
        Self::take(&self.gets, path)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<JsonResponse> {
        self.record("POST", path, Some(body.clone()));
        self.wait_gate().await;
        Self::take(&self.posts, path)
    }

    async fn post_upload(&self, path: &str, upload: &ArticleUpload) -> Result<JsonResponse> {
        // Record the upload as the field map the wire encoding would carry.
        let body = serde_json::json!({
            "title": upload.title,
            "authors": upload.authors,
            "original_link": upload.original_link,
            "file": upload.file_name,
        });
        self.record("POST", path, Some(body));
        self.wait_gate().await;
        Self::take(&self.posts, path)
    }

    async fn post_binary(&self, path: &str, body: &Value) -> Result<Vec<u8>> {
        self.record("POST", path, Some(body.clone()));
        self.wait_gate().await;
        self.pdfs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or(ArchiveError::Status { status: 404 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn unscripted_path_is_404() {
        let transport = ScriptedTransport::new();
        let resp = transport.get_json("/nowhere").await.unwrap();
        assert_eq!(resp.status, 404);
    }

    #[tokio::test]
    async fn scripted_replies_consumed_in_order() {
        let transport = ScriptedTransport::new();
        transport.on_get("/x", 500, json!({}));
        transport.on_get("/x", 200, json!({"ok": true}));

        assert_eq!(transport.get_json("/x").await.unwrap().status, 500);
        assert_eq!(transport.get_json("/x").await.unwrap().status, 200);
        assert_eq!(transport.get_json("/x").await.unwrap().status, 404);
        assert_eq!(transport.hits("/x"), 3);
    }

    #[tokio::test]
    async fn scripted_failure_is_transport_error() {
        let transport = ScriptedTransport::new();
        transport.on_get_failure("/x", "connection refused");
        let err = transport.get_json("/x").await.unwrap_err();
        assert!(matches!(err, ArchiveError::Transport(_)));
    }
}

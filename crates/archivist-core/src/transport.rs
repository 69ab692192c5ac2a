//! Transport seam between client logic and HTTP.
//!
//! `ArchiveTransport` is the only boundary that touches the network. HTTP
//! error statuses are data (`JsonResponse.status`), not errors — fallback
//! logic above the trait decides what a 404 means for each operation.
//! `Err` is reserved for transport-level failures. In-memory fakes for
//! tests live in the `fakes` module.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::error::Result;
use crate::domain::ArticleUpload;

/// A decoded HTTP response: status plus whatever JSON body was present.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: u16,
    /// `None` when the body was absent or not decodable as JSON.
    pub body: Option<Value>,
}

impl JsonResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn not_found(&self) -> bool {
        self.status == 404
    }
}

/// Async transport to the archive backend. Backend-agnostic; implemented
/// over reqwest for production and scripted in-memory for tests.
#[async_trait]
pub trait ArchiveTransport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<JsonResponse>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<JsonResponse>;

    /// Multipart upload of a new article.
    async fn post_upload(&self, path: &str, upload: &ArticleUpload) -> Result<JsonResponse>;

    /// POST returning a raw binary payload (certificate PDF).
    async fn post_binary(&self, path: &str, body: &Value) -> Result<Vec<u8>>;
}

//! Reqwest-backed transport.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::domain::error::{ArchiveError, Result};
use crate::domain::ArticleUpload;
use crate::transport::{ArchiveTransport, JsonResponse};

/// Backend connection configuration.
///
/// The base URL is injected here at construction; nothing in the client
/// hardcodes it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Archive backend base URL, no trailing slash required.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: std::env::var("ARCHIVIST_BACKEND_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            timeout: Duration::from_secs(30),
            user_agent: format!("archivist/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl BackendConfig {
    /// Config for a specific backend.
    pub fn new(base_url: &str) -> Self {
        BackendConfig {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Config from `ARCHIVIST_BACKEND_URL`.
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP transport over reqwest.
pub struct HttpTransport {
    config: BackendConfig,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;
        Ok(HttpTransport {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn decode(resp: reqwest::Response) -> JsonResponse {
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.ok();
        JsonResponse { status, body }
    }
}

/// Multipart fields for the bibliography list: indexed names
/// (`bibliography[0]`, `bibliography[1]`, ...), blank entries skipped but
/// keeping their original slot index.
fn bibliography_fields(bibliography: &[String]) -> Vec<(String, String)> {
    bibliography
        .iter()
        .enumerate()
        .filter(|(_, src)| !src.trim().is_empty())
        .map(|(i, src)| (format!("bibliography[{i}]"), src.clone()))
        .collect()
}

#[async_trait]
impl ArchiveTransport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<JsonResponse> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;
        Ok(Self::decode(resp).await)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<JsonResponse> {
        let url = self.url(path);
        debug!(%url, "POST");
        let resp = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;
        Ok(Self::decode(resp).await)
    }

    async fn post_upload(&self, path: &str, upload: &ArticleUpload) -> Result<JsonResponse> {
        let url = self.url(path);
        debug!(%url, file = %upload.file_name, "POST multipart");

        let mut form = Form::new()
            .text("title", upload.title.clone())
            .text("authors", upload.authors.clone())
            .text("original_link", upload.original_link.clone());
        for (name, value) in bibliography_fields(&upload.bibliography) {
            form = form.text(name, value);
        }
        let file = Part::bytes(upload.file_bytes.clone()).file_name(upload.file_name.clone());
        form = form.part("file", file);

        let resp = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;
        Ok(Self::decode(resp).await)
    }

    async fn post_binary(&self, path: &str, body: &Value) -> Result<Vec<u8>> {
        let url = self.url(path);
        debug!(%url, "POST (binary response)");
        let resp = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ArchiveError::Status { status });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ArchiveError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

//! High-level archive client.
//!
//! Wraps an [`ArchiveTransport`] with the per-operation contract rules:
//! article fetches are fatal on failure, comment fetches are best-effort
//! with ordered endpoint fallback, submissions surface duplicates as a
//! distinct outcome. Nothing here retries automatically and nothing here
//! holds state between calls — session state lives in
//! [`crate::session::ArticleSession`].

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::error::{ArchiveError, Result};
use crate::domain::{
    Article, ArticleSummary, ArticleUpload, Certificate, Comment, CommentDraft, ContentDigest,
};
use crate::http::{BackendConfig, HttpTransport};
use crate::normalize;
use crate::transport::ArchiveTransport;

/// Server-confirmed result of a comment submission.
#[derive(Debug, Clone)]
pub struct ConfirmedComment {
    pub comment: Comment,
    /// Signed delta the server applied to the article aggregate.
    pub spend_applied: Option<f64>,
    /// Authoritative new aggregate total, when the server reports one.
    pub points_total: Option<f64>,
}

/// Client for the archive backend.
#[derive(Clone)]
pub struct ArchiveClient {
    transport: Arc<dyn ArchiveTransport>,
}

impl ArchiveClient {
    pub fn new(transport: Arc<dyn ArchiveTransport>) -> Self {
        ArchiveClient { transport }
    }

    /// Client over HTTP with the given backend configuration.
    pub fn over_http(config: BackendConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    // -- articles -----------------------------------------------------------

    /// Fetch one article. No fallback: transport failures, missing
    /// articles, and unrecognizable shapes are all fatal here.
    pub async fn fetch_article(&self, id: &str) -> Result<Article> {
        let path = format!("/article?id={}", encode_query(id));
        let resp = self.transport.get_json(&path).await?;
        if resp.not_found() {
            return Err(ArchiveError::NotFound(format!("article {id}")));
        }
        if !resp.ok() {
            return Err(ArchiveError::Status {
                status: resp.status,
            });
        }
        let body = resp.body.ok_or_else(|| {
            ArchiveError::MalformedResponse("article response had no JSON body".to_string())
        })?;
        normalize::normalize_article(&body)
    }

    /// Fetch the archive index. Best-effort: any failure is an empty
    /// listing.
    pub async fn fetch_article_index(&self) -> Vec<ArticleSummary> {
        match self.transport.get_json("/articles").await {
            Ok(resp) if resp.ok() => resp
                .body
                .map(|body| normalize::normalize_article_index(&body))
                .unwrap_or_default(),
            Ok(resp) => {
                debug!(status = resp.status, "article index unavailable");
                Vec::new()
            }
            Err(err) => {
                debug!(error = %err, "article index unavailable");
                Vec::new()
            }
        }
    }

    // -- comments -----------------------------------------------------------

    /// Candidate endpoints for an article's comments, in priority order.
    fn comment_endpoints(id: &str) -> [String; 2] {
        let id = encode_query(id);
        [format!("/articles/{id}/comments"), format!("/comments/{id}")]
    }

    /// Fetch an article's comments, probing candidate endpoints strictly
    /// sequentially. The first 2xx response with a recognizable shape
    /// wins and stops the probe; a 404, any other error status, an
    /// unrecognizable shape, or a transport failure advances to the next
    /// candidate. Exhaustion is an empty list, never an error — shape
    /// priority, not latency, decides the winner.
    pub async fn fetch_comments(&self, article_id: &str) -> Vec<Comment> {
        for endpoint in Self::comment_endpoints(article_id) {
            match self.transport.get_json(&endpoint).await {
                Ok(resp) if resp.ok() => {
                    let normalized = resp.body.as_ref().and_then(normalize::normalize_comment_list);
                    match normalized {
                        Some(comments) => return comments,
                        None => {
                            debug!(%endpoint, "unrecognized comment shape, trying next candidate");
                        }
                    }
                }
                Ok(resp) => {
                    debug!(%endpoint, status = resp.status, "comment endpoint miss");
                }
                Err(err) => {
                    debug!(%endpoint, error = %err, "comment endpoint unreachable");
                }
            }
        }
        Vec::new()
    }

    /// Submit a comment draft for an article.
    ///
    /// Validates before any network call. A `{duplicate: true}` reply is
    /// `ArchiveError::Duplicate`; the backend does not redisclose the
    /// existing record's digest and neither does this client.
    pub async fn add_comment(
        &self,
        article_id: &str,
        draft: &CommentDraft,
    ) -> Result<ConfirmedComment> {
        draft.validate()?;
        let spend_points = draft.points();
        let payload = json!({
            "article_id": article_id,
            "commenter_name": draft.display_name(),
            "comment": draft.body.trim(),
            "citations": draft.citations,
            "has_identifying_info": draft.has_identifying_info,
            "spend_points": spend_points,
            "spend_direction": draft.spend_direction.as_str(),
        });

        let resp = self.transport.post_json("/add-comment", &payload).await?;
        let ok = resp.ok();
        let status = resp.status;
        let body = resp.body.unwrap_or(Value::Null);
        if is_duplicate(&body) {
            return Err(ArchiveError::Duplicate);
        }
        if !ok {
            return Err(ArchiveError::Status { status });
        }
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(ArchiveError::Rejected(error_message(&body)));
        }

        let comment = body
            .get("comment")
            .and_then(normalize::normalize_comment)
            .ok_or_else(|| {
                ArchiveError::MalformedResponse(
                    "add-comment succeeded without a comment record".to_string(),
                )
            })?;
        Ok(ConfirmedComment {
            comment,
            spend_applied: body.get("spend_applied").and_then(Value::as_f64),
            points_total: body.get("points").and_then(Value::as_f64),
        })
    }

    // -- upload & verification ----------------------------------------------

    /// Upload a new article. Returns the stored record's digest: the
    /// server-recomputed value when present, else the client's advisory
    /// claim.
    pub async fn upload_article(
        &self,
        upload: &ArticleUpload,
        claim: &ContentDigest,
    ) -> Result<ContentDigest> {
        let resp = self.transport.post_upload("/upload", upload).await?;
        let ok = resp.ok();
        let status = resp.status;
        let body = resp.body.unwrap_or(Value::Null);
        if is_duplicate(&body) {
            return Err(ArchiveError::Duplicate);
        }
        if !ok {
            return Err(ArchiveError::Status { status });
        }
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(ArchiveError::Rejected(error_message(&body)));
        }

        let stored = body
            .get("article")
            .and_then(|a| a.get("sha256"))
            .and_then(Value::as_str)
            .and_then(|s| ContentDigest::try_from(s.to_string()).ok());
        match stored {
            Some(digest) => {
                if digest != *claim {
                    // The service recomputes from the stored bytes; its
                    // value is authoritative over our advisory claim.
                    warn!(claimed = %claim.short(), stored = %digest.short(),
                        "stored digest differs from client claim");
                }
                Ok(digest)
            }
            None => Ok(claim.clone()),
        }
    }

    /// Look up the provenance certificate for a digest.
    pub async fn verify_article(&self, digest: &ContentDigest) -> Result<Certificate> {
        let payload = json!({ "sha256": digest.as_str() });
        let resp = self.transport.post_json("/verify-article", &payload).await?;
        if resp.not_found() {
            return Err(ArchiveError::NotFound(format!("digest {}", digest.short())));
        }
        if !resp.ok() {
            return Err(ArchiveError::Status {
                status: resp.status,
            });
        }
        let body = resp.body.unwrap_or(Value::Null);
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(ArchiveError::NotFound(error_message(&body)));
        }
        certificate_from(body.get("certificate")).ok_or_else(|| {
            ArchiveError::MalformedResponse(
                "verification succeeded without a certificate".to_string(),
            )
        })
    }

    /// Fetch the rendered certificate PDF for a digest.
    pub async fn verify_article_pdf(&self, digest: &ContentDigest) -> Result<Vec<u8>> {
        let payload = json!({ "sha256": digest.as_str() });
        self.transport.post_binary("/verify-article-pdf", &payload).await
    }
}

fn is_duplicate(body: &Value) -> bool {
    body.get("duplicate").and_then(Value::as_bool) == Some(true)
}

fn error_message(body: &Value) -> String {
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("backend reported failure")
        .to_string()
}

fn certificate_from(value: Option<&Value>) -> Option<Certificate> {
    let obj = value?.as_object()?;
    let coerce = |name: &str| -> String {
        match obj.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    };
    Some(Certificate {
        article_id: coerce("article_id"),
        title: coerce("title"),
        certificate_id: coerce("certificate_id"),
        verified_at: coerce("verified_at"),
        message: coerce("message"),
    })
}

/// Percent-encode an identifier for use in a path or query segment.
fn encode_query(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

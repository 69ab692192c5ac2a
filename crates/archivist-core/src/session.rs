//! Article session: the submission orchestrator.
//!
//! One session tracks one article at a time: its loaded state, its
//! comment collection, the draft being composed, and a single submission
//! state machine. The session is the sole owner of "what is confirmed":
//! the article's aggregate `points` moves only on the confirmation path,
//! only by a server-reported delta, so a retried submission that the
//! server deduplicates can never double-apply.
//!
//! Stale-fetch protection: every fetch captures the session generation at
//! issue time; switching articles bumps the generation, and a completed
//! fetch re-checks it immediately before committing, so no result from a
//! superseded request can overwrite a newer one regardless of completion
//! order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::client::{ArchiveClient, ConfirmedComment};
use crate::domain::error::{ArchiveError, Result};
use crate::domain::{Article, ArticleUpload, Comment, CommentDraft, ContentDigest};
use crate::scoring::round2;

/// Submission state machine.
///
/// `Idle` and the three terminal states are the only states from which a
/// new submission may begin; a second attempt while one is in flight is
/// rejected, not queued.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    /// Computing the content digest (upload path only).
    Hashing,
    /// Waiting on the backend.
    Submitting,
    /// Server confirmed; state was reconciled from its reply.
    Confirmed,
    /// Content digest already recorded; nothing was mutated.
    DuplicateRejected,
    /// Submission failed; the draft remains editable.
    Failed(String),
}

impl SubmissionState {
    /// Whether a new submission may begin from this state.
    pub fn can_begin(&self) -> bool {
        !matches!(self, SubmissionState::Hashing | SubmissionState::Submitting)
    }
}

#[derive(Debug)]
struct SessionInner {
    article_id: String,
    article: Option<Article>,
    comments: Vec<Comment>,
    draft: Option<CommentDraft>,
    state: SubmissionState,
}

impl Default for SessionInner {
    fn default() -> Self {
        SessionInner {
            article_id: String::new(),
            article: None,
            comments: Vec::new(),
            draft: None,
            state: SubmissionState::Idle,
        }
    }
}

/// Outcome of a confirmed article upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Digest of the stored record (server-recomputed when available).
    pub digest: ContentDigest,
    /// The advisory digest this client computed before submitting.
    pub claimed: ContentDigest,
}

/// Per-article session owning draft state and the submission machine.
pub struct ArticleSession {
    client: ArchiveClient,
    generation: AtomicU64,
    inner: Mutex<SessionInner>,
}

impl ArticleSession {
    pub fn new(client: ArchiveClient) -> Self {
        ArticleSession {
            client,
            generation: AtomicU64::new(0),
            inner: Mutex::new(SessionInner::default()),
        }
    }

    /// Point the session at an article. Bumps the generation so that any
    /// fetch still in flight for the previous article is discarded when
    /// it lands.
    pub fn set_article(&self, article_id: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        *inner = SessionInner {
            article_id: article_id.to_string(),
            ..SessionInner::default()
        };
        debug!(article_id, "session retargeted");
    }

    // -- accessors ----------------------------------------------------------

    pub fn article(&self) -> Option<Article> {
        self.inner.lock().unwrap().article.clone()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.inner.lock().unwrap().comments.clone()
    }

    pub fn state(&self) -> SubmissionState {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn draft(&self) -> Option<CommentDraft> {
        self.inner.lock().unwrap().draft.clone()
    }

    // -- loading ------------------------------------------------------------

    /// Fetch the session's article and its comments.
    ///
    /// The article fetch is fatal on failure; the comment fetch is
    /// best-effort. Results are committed only if the session still
    /// targets the same article when they land.
    pub async fn load(&self) -> Result<()> {
        let generation = self.generation.load(Ordering::SeqCst);
        let article_id = {
            let inner = self.inner.lock().unwrap();
            if inner.article_id.is_empty() {
                return Err(ArchiveError::Validation("no article selected".to_string()));
            }
            inner.article_id.clone()
        };

        let article = self.client.fetch_article(&article_id).await?;
        let comments = self.client.fetch_comments(&article_id).await;

        let mut inner = self.inner.lock().unwrap();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(article_id, "discarding stale fetch result");
            return Ok(());
        }
        info!(article_id, comments = comments.len(), "article loaded");
        inner.article = Some(article);
        inner.comments = comments;
        Ok(())
    }

    // -- comment submission -------------------------------------------------

    /// Stage a draft for submission. Rejected while a submission is in
    /// flight; otherwise the draft stays editable until confirmed.
    pub fn set_draft(&self, draft: CommentDraft) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.state.can_begin() {
            return Err(ArchiveError::SubmissionInFlight);
        }
        inner.draft = Some(draft);
        Ok(())
    }

    /// Submit the staged draft.
    ///
    /// Validation failures block before any network call. On
    /// confirmation the server's comment record is appended (timestamp
    /// defaulted locally when omitted) and the server-reported delta is
    /// applied to the aggregate; the client's own estimate is never
    /// applied. On duplicate or failure nothing is mutated.
    pub async fn submit_comment(&self) -> Result<SubmissionState> {
        let generation = self.generation.load(Ordering::SeqCst);
        let (article_id, draft) = {
            let mut inner = self.inner.lock().unwrap();
            if !inner.state.can_begin() {
                return Err(ArchiveError::SubmissionInFlight);
            }
            if inner.article.is_none() {
                return Err(ArchiveError::Validation("no article loaded".to_string()));
            }
            let draft = inner
                .draft
                .clone()
                .ok_or_else(|| ArchiveError::Validation("no draft staged".to_string()))?;
            draft.validate()?;
            inner.state = SubmissionState::Submitting;
            (inner.article_id.clone(), draft)
        };

        let outcome = self.client.add_comment(&article_id, &draft).await;

        let mut inner = self.inner.lock().unwrap();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(article_id, "discarding stale submission result");
            return Ok(inner.state.clone());
        }
        match outcome {
            Ok(confirmed) => {
                self.apply_confirmation(&mut inner, confirmed);
                inner.state = SubmissionState::Confirmed;
            }
            Err(ArchiveError::Duplicate) => {
                info!(article_id, "submission rejected as duplicate");
                inner.state = SubmissionState::DuplicateRejected;
            }
            Err(err) => {
                warn!(article_id, error = %err, "submission failed");
                inner.state = SubmissionState::Failed(err.to_string());
            }
        }
        Ok(inner.state.clone())
    }

    fn apply_confirmation(&self, inner: &mut SessionInner, confirmed: ConfirmedComment) {
        if let Some(article) = inner.article.as_mut() {
            if let Some(delta) = confirmed.spend_applied {
                article.points = round2(article.points + delta);
            } else if let Some(total) = confirmed.points_total {
                // Still server-derived, never our own estimate.
                article.points = round2(total);
            }
        }
        info!(comment_id = %confirmed.comment.id, "comment confirmed");
        inner.comments.push(confirmed.comment);
        inner.draft = None;
    }

    // -- article upload -----------------------------------------------------

    /// Upload a new article through the session state machine:
    /// `Idle -> Hashing -> Submitting -> terminal`.
    ///
    /// The digest computed here is an advisory claim; the stored record's
    /// digest in the outcome is whatever the service recomputed. On a
    /// duplicate the existing record's digest is not redisclosed.
    pub async fn submit_upload(&self, upload: ArticleUpload) -> Result<UploadOutcome> {
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.state.can_begin() {
                return Err(ArchiveError::SubmissionInFlight);
            }
            upload.validate()?;
            inner.state = SubmissionState::Hashing;
        }

        let claimed = ContentDigest::from_bytes(&upload.file_bytes);
        debug!(digest = %claimed.short(), "content hashed");
        {
            let mut inner = self.inner.lock().unwrap();
            inner.state = SubmissionState::Submitting;
        }

        let result = self.client.upload_article(&upload, &claimed).await;

        let mut inner = self.inner.lock().unwrap();
        match result {
            Ok(digest) => {
                info!(digest = %digest.short(), "upload confirmed");
                inner.state = SubmissionState::Confirmed;
                Ok(UploadOutcome { digest, claimed })
            }
            Err(ArchiveError::Duplicate) => {
                info!("upload rejected as duplicate");
                inner.state = SubmissionState::DuplicateRejected;
                Err(ArchiveError::Duplicate)
            }
            Err(err) => {
                warn!(error = %err, "upload failed");
                inner.state = SubmissionState::Failed(err.to_string());
                Err(err)
            }
        }
    }
}

//! Archivist core library.
//!
//! Client-side core for a content-addressable article archive: canonical
//! content hashing, tolerant response normalization with ordered endpoint
//! fallback, deterministic annotation scoring, and the submission state
//! machine that reconciles optimistic local state with server-confirmed
//! results. The storage backend is an external HTTP service; this crate
//! owns only the client-observable contract with it.

pub mod client;
pub mod domain;
pub mod fakes;
pub mod http;
pub mod normalize;
pub mod scoring;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use client::{ArchiveClient, ConfirmedComment};
pub use domain::{
    Article, ArticleSummary, ArticleUpload, ArchiveError, Certificate, Comment, CommentDraft,
    ContentDigest, Result, SpendDirection, MIN_BODY_CHARS,
};
pub use http::{BackendConfig, HttpTransport};
pub use normalize::{normalize_article, normalize_comment, normalize_comment_list};
pub use scoring::{applied_delta, compute_points, count_citations, round2, split_citations};
pub use session::{ArticleSession, SubmissionState, UploadOutcome};
pub use telemetry::init_tracing;
pub use transport::{ArchiveTransport, JsonResponse};

/// Archivist version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

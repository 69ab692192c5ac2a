//! Domain models for the article archive client.
//!
//! Canonical definitions for the core entities:
//! - `Article` / `ArticleSummary`: stored documents and index rows
//! - `Comment` / `CommentDraft`: scored annotations
//! - `ContentDigest`: SHA-256 content fingerprint
//! - `Certificate`: provenance record from the Verification Service

pub mod article;
pub mod certificate;
pub mod comment;
pub mod digest;
pub mod error;

pub use article::{Article, ArticleSummary, ArticleUpload};
pub use certificate::Certificate;
pub use comment::{Comment, CommentDraft, SpendDirection, MIN_BODY_CHARS};
pub use digest::ContentDigest;
pub use error::{ArchiveError, Result};

//! Article and upload models.

use serde::{Deserialize, Serialize};

use crate::domain::error::{ArchiveError, Result};

/// A stored article as seen by readers.
///
/// `points` is the server-authoritative aggregate reputation score
/// (non-negative, 2-decimal precision). It is mutated only by applying
/// server-confirmed deltas on the session's confirmation path, never by a
/// client-side estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub points: f64,
    pub file_url: Option<String>,
}

/// One row of the archive index listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub points: f64,
}

/// A draft article upload: everything the archive needs to store a new
/// document and issue its content digest.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleUpload {
    pub title: String,
    pub authors: String,
    pub original_link: String,
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    /// Bibliography sources, order-preserving. Blank entries are dropped
    /// at encoding time but keep their original slot index on the wire.
    pub bibliography: Vec<String>,
}

impl ArticleUpload {
    /// Check the upload is submittable. Runs before any hashing or
    /// network call.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ArchiveError::Validation("upload requires a title".into()));
        }
        if self.file_bytes.is_empty() {
            return Err(ArchiveError::Validation("upload requires a file".into()));
        }
        Ok(())
    }
}

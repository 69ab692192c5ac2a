//! Provenance certificates issued by the Verification Service.

use serde::{Deserialize, Serialize};

/// A server-issued record asserting that a digest corresponds to a
/// specific stored article. Retrievable as JSON (this type) or as a
/// rendered PDF via the binary endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub article_id: String,
    pub title: String,
    pub certificate_id: String,
    pub verified_at: String,
    pub message: String,
}

//! Error taxonomy for the archive client core.

use thiserror::Error;

/// Errors surfaced by the archive client.
///
/// Propagation rules differ per operation: an article fetch treats
/// transport, not-found, and malformed-shape failures as fatal; a comment
/// fetch absorbs all of them into an empty result; a submission surfaces
/// duplicates and transport failures as distinct outcomes without touching
/// session state. Nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Network-level failure (connection refused, timeout, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP error status outside the 2xx range.
    #[error("backend returned status {status}")]
    Status { status: u16 },

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Decodable response whose shape matched no known interpretation.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Client-side validation failed before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// The content digest is already recorded by the backend.
    #[error("content already recorded")]
    Duplicate,

    /// A submission is already in flight for this session.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// The server reported a submission failure with a reason.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// Digest string is not 64 hex chars.
    #[error("invalid digest hex: {0}")]
    InvalidDigest(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for archive client operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

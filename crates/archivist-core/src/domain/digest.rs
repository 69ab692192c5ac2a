//! Content digests used as article fingerprints.
//!
//! An article's digest is the SHA-256 of the UTF-8 bytes of its content
//! alone. Title and metadata are deliberately excluded so that identical
//! body text filed under different titles is recognized as a duplicate.
//!
//! A digest computed client-side is advisory: the Verification Service
//! recomputes and stores the authoritative value, and may accept the
//! client's claim, reject it as mismatched, or report it as a duplicate
//! of an existing record.

use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::error::ArchiveError;

/// SHA-256 content fingerprint (64 lowercase hex chars).
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes`/`from_content` or validated
/// via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the digest of raw content bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Compute the digest of article content text (UTF-8 encoding of the
    /// content alone — no title, no metadata).
    pub fn from_content(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars), for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = ArchiveError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ArchiveError::InvalidDigest(s));
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::str::FromStr for ContentDigest {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentDigest::try_from(s.to_string())
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_64_lowercase_hex() {
        let d = ContentDigest::from_content("some article body");
        assert_eq!(d.as_str().len(), 64);
        assert!(d.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(d.as_str(), d.as_str().to_ascii_lowercase());
    }

    #[test]
    fn digest_deterministic() {
        let a = ContentDigest::from_content("identical content");
        let b = ContentDigest::from_content("identical content");
        assert_eq!(a, b);
    }

    #[test]
    fn digest_sensitive_to_content() {
        let a = ContentDigest::from_content("content a");
        let b = ContentDigest::from_content("content b");
        assert_ne!(a, b);
    }

    #[test]
    fn content_only_no_title_mixing() {
        // Same body under different titles must collide on purpose; the
        // title never enters the hash.
        let body = "the body of the article";
        assert_eq!(
            ContentDigest::from_content(body),
            ContentDigest::from_bytes(body.as_bytes()),
        );
    }

    #[test]
    fn known_vector() {
        // SHA-256 of the empty string.
        let d = ContentDigest::from_content("");
        assert_eq!(
            d.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn try_from_rejects_bad_length_and_non_hex() {
        assert!(ContentDigest::try_from("abcd".to_string()).is_err());
        assert!(ContentDigest::try_from("z".repeat(64)).is_err());
    }

    #[test]
    fn try_from_lowercases() {
        let upper = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";
        let d = ContentDigest::try_from(upper.to_string()).unwrap();
        assert_eq!(d.as_str(), upper.to_ascii_lowercase());
    }

    #[test]
    fn display_short() {
        let d = ContentDigest::from_content("x");
        assert_eq!(d.short().len(), 12);
        assert!(d.to_string().starts_with(d.short()));
    }
}

//! Comment (annotation) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ArchiveError, Result};

/// Minimum comment body length after trimming.
pub const MIN_BODY_CHARS: usize = 3;

/// Sign applied to an annotation's computed score when it adjusts the
/// article's aggregate reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendDirection {
    Up,
    Down,
}

impl SpendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpendDirection::Up => "up",
            SpendDirection::Down => "down",
        }
    }
}

impl std::fmt::Display for SpendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored annotation attached to an article.
///
/// Comments are immutable once the server confirms them; they are never
/// locally edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub article_id: String,
    pub commenter_name: String,
    pub body: String,
    /// Ordered, may be empty. When the server sends only a count, this
    /// stays empty and `citations_count` carries the number.
    pub citations: Vec<String>,
    pub citations_count: usize,
    pub has_identifying_info: bool,
    pub points: f64,
    pub spend_direction: SpendDirection,
    pub created_at: DateTime<Utc>,
}

/// A comment being composed client-side, before submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDraft {
    /// Absent means the annotation is posted as "Anonymous".
    pub commenter_name: Option<String>,
    pub body: String,
    pub citations: Vec<String>,
    pub has_identifying_info: bool,
    pub spend_direction: SpendDirection,
}

impl CommentDraft {
    /// Validate the draft. Rejection here blocks submission before any
    /// network call; a too-short body is a validation error, not a zero
    /// score.
    pub fn validate(&self) -> Result<()> {
        if self.body.trim().chars().count() < MIN_BODY_CHARS {
            return Err(ArchiveError::Validation(format!(
                "comment body must be at least {} characters",
                MIN_BODY_CHARS
            )));
        }
        Ok(())
    }

    /// The deterministic point value this draft would earn.
    pub fn points(&self) -> f64 {
        crate::scoring::compute_points(
            self.body.trim(),
            &self.citations,
            self.has_identifying_info,
        )
    }

    /// Name to submit under.
    pub fn display_name(&self) -> &str {
        self.commenter_name.as_deref().unwrap_or("Anonymous")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(body: &str) -> CommentDraft {
        CommentDraft {
            commenter_name: None,
            body: body.to_string(),
            citations: vec![],
            has_identifying_info: false,
            spend_direction: SpendDirection::Up,
        }
    }

    #[test]
    fn short_body_rejected_before_scoring() {
        let err = draft("hi").validate().unwrap_err();
        assert!(matches!(err, ArchiveError::Validation(_)));
    }

    #[test]
    fn whitespace_padding_does_not_satisfy_minimum() {
        assert!(draft("  a  ").validate().is_err());
        assert!(draft(" abc ").validate().is_ok());
    }

    #[test]
    fn anonymous_default_name() {
        assert_eq!(draft("abc").display_name(), "Anonymous");
        let mut d = draft("abc");
        d.commenter_name = Some("Reviewer".to_string());
        assert_eq!(d.display_name(), "Reviewer");
    }

    #[test]
    fn spend_direction_wire_form() {
        assert_eq!(SpendDirection::Up.as_str(), "up");
        assert_eq!(SpendDirection::Down.to_string(), "down");
        let v = serde_json::to_value(SpendDirection::Down).unwrap();
        assert_eq!(v, serde_json::json!("down"));
    }
}

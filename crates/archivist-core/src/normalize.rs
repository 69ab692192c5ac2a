//! Shape normalization for backend responses.
//!
//! The backend has drifted through several response envelopes for the
//! same logical endpoints. Rather than chained ad-hoc fallbacks at every
//! call site, each response kind gets an explicit ordered list of shape
//! matchers — pure functions from a decoded value to `Option<...>` —
//! tried in fixed priority order. "Valid JSON, unexpected shape" is never
//! fatal for list responses; only exhausting every interpretation is.
//!
//! Normalization is stateless: no call retains anything across calls.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::domain::{Article, ArticleSummary, Comment, SpendDirection};
use crate::domain::error::{ArchiveError, Result};

// ---------------------------------------------------------------------------
// Scalar coercion helpers
// ---------------------------------------------------------------------------

/// Identifiers arrive as strings or numbers depending on backend vintage.
fn as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// First present-and-coercible string among aliased field names.
fn string_alias(obj: &serde_json::Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| obj.get(*name).and_then(|v| v.as_str().map(String::from)))
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

fn article_from_object(obj: &serde_json::Map<String, Value>) -> Article {
    Article {
        id: obj.get("id").and_then(as_id).unwrap_or_default(),
        title: string_alias(obj, &["title"]).unwrap_or_default(),
        content: string_alias(obj, &["content", "text", "body"]).unwrap_or_default(),
        points: obj.get("points").and_then(as_f64).unwrap_or(0.0),
        file_url: string_alias(obj, &["file_url", "fileUrl"]),
    }
}

/// Normalize an article response.
///
/// Resolution order: the value itself when it carries article fields
/// (bare object), else the nested `article` field, else any bare object.
/// An empty resulting object is "not found", not malformed.
pub fn normalize_article(raw: &Value) -> Result<Article> {
    let candidate = match raw.as_object() {
        Some(obj) if obj.contains_key("title") || obj.contains_key("content") => obj,
        Some(obj) => match obj.get("article").and_then(Value::as_object) {
            Some(nested) => nested,
            None => obj,
        },
        None => {
            return Err(ArchiveError::MalformedResponse(
                "article response is not a JSON object".to_string(),
            ))
        }
    };

    if candidate.is_empty() {
        return Err(ArchiveError::NotFound("article not found".to_string()));
    }
    Ok(article_from_object(candidate))
}

/// Normalize the archive index listing: `{articles: [...]}` or a bare
/// array. Best-effort; an unrecognized shape is an empty listing.
pub fn normalize_article_index(raw: &Value) -> Vec<ArticleSummary> {
    let entries = match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("articles").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            Some(ArticleSummary {
                id: obj.get("id").and_then(as_id)?,
                title: string_alias(obj, &["title"]).unwrap_or_default(),
                points: obj.get("points").and_then(as_f64).unwrap_or(0.0),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Comment list
// ---------------------------------------------------------------------------

type ListMatcher = fn(&Value) -> Option<Vec<Value>>;

fn match_bare_array(v: &Value) -> Option<Vec<Value>> {
    v.as_array().cloned()
}

fn match_comments_field(v: &Value) -> Option<Vec<Value>> {
    v.get("comments")?.as_array().cloned()
}

/// Some storage backends wrap rows in a generic `data` envelope.
fn match_data_wrapper(v: &Value) -> Option<Vec<Value>> {
    v.get("data")?.as_array().cloned()
}

fn match_empty(v: &Value) -> Option<Vec<Value>> {
    let empty_object = v.as_object().is_some_and(|o| o.is_empty());
    if v.is_null() || empty_object {
        Some(Vec::new())
    } else {
        None
    }
}

/// Ordered shape matchers for comment-list responses. First match wins.
const COMMENT_LIST_MATCHERS: &[ListMatcher] = &[
    match_bare_array,
    match_comments_field,
    match_data_wrapper,
    match_empty,
];

/// Normalize a comment-list response to canonical comments.
///
/// Returns `None` only when no matcher applies (unrecognized shape);
/// callers on the comment path treat that the same as an empty result.
pub fn normalize_comment_list(raw: &Value) -> Option<Vec<Comment>> {
    let entries = COMMENT_LIST_MATCHERS.iter().find_map(|m| m(raw))?;
    let comments = entries
        .iter()
        .filter_map(|entry| {
            let comment = normalize_comment(entry);
            if comment.is_none() {
                debug!("skipping non-object comment entry");
            }
            comment
        })
        .collect();
    Some(comments)
}

/// Normalize a single comment record, reconciling field-name drift.
pub fn normalize_comment(raw: &Value) -> Option<Comment> {
    let obj = raw.as_object()?;

    let body = string_alias(obj, &["comment", "content", "text", "body"]).unwrap_or_default();
    let commenter_name = string_alias(obj, &["commenter_name", "commenter", "name"])
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Anonymous".to_string());

    // Citations arrive either as the ordered list itself or as a bare count.
    let citations: Vec<String> = obj
        .get("citations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    let citations_count = if citations.is_empty() {
        obj.get("citations_count")
            .or_else(|| obj.get("citations"))
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize
    } else {
        citations.len()
    };

    let spend_direction = match string_alias(obj, &["spend_direction"]).as_deref() {
        Some("down") => SpendDirection::Down,
        _ => SpendDirection::Up,
    };

    Some(Comment {
        id: obj.get("id").and_then(as_id).unwrap_or_default(),
        article_id: obj.get("article_id").and_then(as_id).unwrap_or_default(),
        commenter_name,
        body,
        citations,
        citations_count,
        has_identifying_info: obj
            .get("has_identifying_info")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        points: obj
            .get("points")
            .or_else(|| obj.get("point"))
            .and_then(as_f64)
            .unwrap_or(0.0),
        spend_direction,
        created_at: normalize_timestamp(obj),
    })
}

/// Timestamp under any of its historical names, defaulted to now when the
/// server omits it.
fn normalize_timestamp(obj: &serde_json::Map<String, Value>) -> DateTime<Utc> {
    ["created_at", "createdAt", "created"]
        .iter()
        .find_map(|name| obj.get(*name))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- article ------------------------------------------------------------

    #[test]
    fn article_bare_object() {
        let raw = json!({"id": 7, "title": "T", "content": "C", "points": 3.5});
        let article = normalize_article(&raw).unwrap();
        assert_eq!(article.id, "7");
        assert_eq!(article.title, "T");
        assert_eq!(article.points, 3.5);
        assert_eq!(article.file_url, None);
    }

    #[test]
    fn article_wrapped_object() {
        let raw = json!({"article": {"id": "a1", "title": "T", "content": "C", "points": 0}});
        let article = normalize_article(&raw).unwrap();
        assert_eq!(article.id, "a1");
    }

    #[test]
    fn bare_and_wrapped_agree() {
        let inner = json!({"id": 1, "title": "T", "content": "C", "points": 1.25});
        let bare = normalize_article(&inner).unwrap();
        let wrapped = normalize_article(&json!({ "article": inner })).unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn empty_object_is_not_found() {
        assert!(matches!(
            normalize_article(&json!({})),
            Err(ArchiveError::NotFound(_))
        ));
        assert!(matches!(
            normalize_article(&json!({"article": {}})),
            Err(ArchiveError::NotFound(_))
        ));
    }

    #[test]
    fn non_object_is_malformed() {
        assert!(matches!(
            normalize_article(&json!([1, 2])),
            Err(ArchiveError::MalformedResponse(_))
        ));
        assert!(matches!(
            normalize_article(&json!("nope")),
            Err(ArchiveError::MalformedResponse(_))
        ));
    }

    // -- comment list -------------------------------------------------------

    fn sample_comments() -> Value {
        json!([
            {"id": 1, "article_id": 9, "comment": "first", "citations_count": 1, "points": 2.03},
            {"id": 2, "article_id": 9, "body": "second", "citations": ["a", "b"], "points": 4.06},
        ])
    }

    #[test]
    fn three_envelopes_normalize_identically() {
        let elements = sample_comments();
        let bare = normalize_comment_list(&elements).unwrap();
        let named = normalize_comment_list(&json!({ "comments": elements })).unwrap();
        let generic = normalize_comment_list(&json!({ "data": elements })).unwrap();
        assert_eq!(bare.len(), 2);
        assert_eq!(bare, named);
        assert_eq!(bare, generic);
    }

    #[test]
    fn null_and_empty_object_are_empty_lists() {
        assert_eq!(normalize_comment_list(&Value::Null).unwrap(), vec![]);
        assert_eq!(normalize_comment_list(&json!({})).unwrap(), vec![]);
    }

    #[test]
    fn unrecognized_shape_is_none() {
        assert!(normalize_comment_list(&json!({"rows": []})).is_none());
        assert!(normalize_comment_list(&json!(42)).is_none());
    }

    #[test]
    fn bare_array_wins_over_field_lookup() {
        // An array is matched directly even if its elements carry
        // `comments`-shaped fields of their own.
        let raw = json!([{"comment": "x"}]);
        assert_eq!(normalize_comment_list(&raw).unwrap().len(), 1);
    }

    // -- single comment -----------------------------------------------------

    #[test]
    fn body_field_aliases() {
        for field in ["comment", "content", "text", "body"] {
            let c = normalize_comment(&json!({ "id": 1, field: "hello" })).unwrap();
            assert_eq!(c.body, "hello", "alias {field}");
        }
    }

    #[test]
    fn commenter_defaults_to_anonymous() {
        let c = normalize_comment(&json!({"id": 1, "comment": "x"})).unwrap();
        assert_eq!(c.commenter_name, "Anonymous");
        let c = normalize_comment(&json!({"id": 1, "comment": "x", "name": "Ada"})).unwrap();
        assert_eq!(c.commenter_name, "Ada");
    }

    #[test]
    fn citations_list_drives_count() {
        let c =
            normalize_comment(&json!({"id": 1, "comment": "x", "citations": ["a", "b", "c"]}))
                .unwrap();
        assert_eq!(c.citations, vec!["a", "b", "c"]);
        assert_eq!(c.citations_count, 3);
    }

    #[test]
    fn citations_count_fallbacks() {
        let c = normalize_comment(&json!({"id": 1, "comment": "x", "citations_count": 4}))
            .unwrap();
        assert!(c.citations.is_empty());
        assert_eq!(c.citations_count, 4);

        // Oldest vintage: `citations` itself is the count.
        let c = normalize_comment(&json!({"id": 1, "comment": "x", "citations": 2})).unwrap();
        assert_eq!(c.citations_count, 2);
    }

    #[test]
    fn timestamp_parsed_or_defaulted() {
        let c = normalize_comment(
            &json!({"id": 1, "comment": "x", "created_at": "2025-06-01T12:00:00Z"}),
        )
        .unwrap();
        assert_eq!(c.created_at.to_rfc3339(), "2025-06-01T12:00:00+00:00");

        let before = Utc::now();
        let c = normalize_comment(&json!({"id": 1, "comment": "x"})).unwrap();
        assert!(c.created_at >= before);
    }

    #[test]
    fn non_object_entries_skipped() {
        let raw = json!([{"id": 1, "comment": "ok"}, "junk", 42]);
        let comments = normalize_comment_list(&raw).unwrap();
        assert_eq!(comments.len(), 1);
    }

    // -- index --------------------------------------------------------------

    #[test]
    fn index_named_and_bare() {
        let rows = json!([{"id": 1, "title": "A", "points": 1.0}]);
        assert_eq!(normalize_article_index(&json!({ "articles": rows })).len(), 1);
        assert_eq!(normalize_article_index(&rows).len(), 1);
        assert!(normalize_article_index(&json!({"other": []})).is_empty());
    }
}

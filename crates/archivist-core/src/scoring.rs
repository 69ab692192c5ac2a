//! Deterministic annotation scoring.
//!
//! `score = round2(chars(body)/100 + 2 * nonblank_citations + 5 * disclosure)`
//!
//! The score a client computes here is only an estimate for display and
//! for the `spend_points` field of a submission; the article's stored
//! aggregate moves exclusively by the delta the server reports back on a
//! confirmed submission.

use crate::domain::SpendDirection;

/// Points per non-blank citation.
const CITATION_POINTS: f64 = 2.0;

/// Points for disclosing identifying information.
const DISCLOSURE_POINTS: f64 = 5.0;

/// Round to 2-decimal precision, the precision of every point value in
/// the archive.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Count citation entries after discarding blank/whitespace-only ones.
pub fn count_citations(citations: &[String]) -> usize {
    citations.iter().filter(|c| !c.trim().is_empty()).count()
}

/// Split free-text citations into entries, one per line. Blank lines are
/// kept here (slot order matters to callers); they are discarded by
/// `count_citations` at scoring time.
pub fn split_citations(text: &str) -> Vec<String> {
    text.lines().map(|l| l.to_string()).collect()
}

/// Compute the point value of a candidate annotation.
///
/// Pure and deterministic: equal inputs always yield equal output. The
/// caller is responsible for validating the body length first; an
/// undersized body is a validation error, not a zero score.
pub fn compute_points(body: &str, citations: &[String], has_identifying_info: bool) -> f64 {
    let length_points = body.chars().count() as f64 / 100.0;
    let citation_points = CITATION_POINTS * count_citations(citations) as f64;
    let disclosure_points = if has_identifying_info {
        DISCLOSURE_POINTS
    } else {
        0.0
    };
    round2(length_points + citation_points + disclosure_points)
}

/// The signed delta a confirmed annotation applies to its article's
/// aggregate score.
pub fn applied_delta(points: f64, direction: SpendDirection) -> f64 {
    match direction {
        SpendDirection::Up => points,
        SpendDirection::Down => -points,
    }
}

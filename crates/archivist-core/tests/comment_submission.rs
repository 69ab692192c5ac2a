use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use archivist_core::fakes::ScriptedTransport;
use archivist_core::{
    ArchiveClient, ArchiveError, ArticleSession, CommentDraft, SpendDirection, SubmissionState,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn loaded_session(points: f64) -> (Arc<ScriptedTransport>, Arc<ArticleSession>) {
    let transport = Arc::new(ScriptedTransport::new());
    transport.on_get(
        "/article?id=9",
        200,
        json!({"id": 9, "title": "T", "content": "C", "points": points}),
    );
    let session = Arc::new(ArticleSession::new(ArchiveClient::new(transport.clone())));
    session.set_article("9");
    session.load().await.expect("load");
    (transport, session)
}

fn draft(body: &str) -> CommentDraft {
    CommentDraft {
        commenter_name: Some("Reviewer".to_string()),
        body: body.to_string(),
        citations: vec!["source one".to_string()],
        has_identifying_info: false,
        spend_direction: SpendDirection::Up,
    }
}

fn confirmed_reply(delta: f64) -> serde_json::Value {
    json!({
        "success": true,
        "comment": {"id": 77, "article_id": 9, "comment": "a solid point", "points": delta},
        "spend_applied": delta,
    })
}

// ---------------------------------------------------------------------------
// Confirmation path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confirmed_submission_appends_and_applies_server_delta() {
    let (transport, session) = loaded_session(10.0).await;
    transport.on_post("/add-comment", 200, confirmed_reply(2.13));

    session.set_draft(draft("a solid point")).expect("draft");
    let state = session.submit_comment().await.expect("submit");

    assert_eq!(state, SubmissionState::Confirmed);
    assert_eq!(session.article().expect("article").points, 12.13);
    let comments = session.comments();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, "77");
    // Draft is reset only on confirmation.
    assert!(session.draft().is_none());
}

#[tokio::test]
async fn server_total_used_when_no_delta_reported() {
    let (transport, session) = loaded_session(10.0).await;
    transport.on_post(
        "/add-comment",
        200,
        json!({
            "success": true,
            "comment": {"id": 1, "article_id": 9, "comment": "ok then"},
            "points": 15.40,
        }),
    );

    session.set_draft(draft("ok then")).expect("draft");
    session.submit_comment().await.expect("submit");
    assert_eq!(session.article().expect("article").points, 15.40);
}

#[tokio::test]
async fn aggregate_untouched_when_server_reports_nothing() {
    let (transport, session) = loaded_session(10.0).await;
    transport.on_post(
        "/add-comment",
        200,
        json!({
            "success": true,
            "comment": {"id": 1, "article_id": 9, "comment": "ok then"},
        }),
    );

    session.set_draft(draft("ok then")).expect("draft");
    session.submit_comment().await.expect("submit");
    // Never the client's own estimate.
    assert_eq!(session.article().expect("article").points, 10.0);
}

#[tokio::test]
async fn omitted_timestamp_is_defaulted_locally() {
    let (transport, session) = loaded_session(0.0).await;
    transport.on_post("/add-comment", 200, confirmed_reply(0.10));

    let before = chrono::Utc::now();
    session.set_draft(draft("undated reply")).expect("draft");
    session.submit_comment().await.expect("submit");
    assert!(session.comments()[0].created_at >= before);
}

// ---------------------------------------------------------------------------
// Exactly-once delta application under retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_signaled_retry_does_not_double_apply() {
    let (transport, session) = loaded_session(10.0).await;
    transport.on_post("/add-comment", 200, confirmed_reply(2.5));
    // The retried request is deduplicated server-side.
    transport.on_post("/add-comment", 200, json!({"duplicate": true}));

    session.set_draft(draft("same words twice")).expect("draft");
    let first = session.submit_comment().await.expect("first");
    assert_eq!(first, SubmissionState::Confirmed);
    assert_eq!(session.article().expect("article").points, 12.5);

    session.set_draft(draft("same words twice")).expect("redraft");
    let second = session.submit_comment().await.expect("second");
    assert_eq!(second, SubmissionState::DuplicateRejected);

    // Applied exactly once; comment collection not touched either.
    assert_eq!(session.article().expect("article").points, 12.5);
    assert_eq!(session.comments().len(), 1);
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_submission_mutates_nothing_and_keeps_draft() {
    let (transport, session) = loaded_session(10.0).await;
    transport.on_post("/add-comment", 500, json!({"error": "backend down"}));

    session.set_draft(draft("worth keeping")).expect("draft");
    let state = session.submit_comment().await.expect("submit");

    assert!(matches!(state, SubmissionState::Failed(_)));
    assert_eq!(session.article().expect("article").points, 10.0);
    assert!(session.comments().is_empty());
    // Draft stays editable for resubmission.
    assert_eq!(session.draft().expect("draft").body, "worth keeping");
}

#[tokio::test]
async fn validation_blocks_before_any_network_call() {
    let (transport, session) = loaded_session(10.0).await;

    session.set_draft(draft("no")).expect("draft");
    let err = session.submit_comment().await.unwrap_err();
    assert!(matches!(err, ArchiveError::Validation(_)));
    assert_eq!(transport.hits("/add-comment"), 0);
    // Not a submission attempt at all: state never left Idle.
    assert_eq!(session.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn submit_without_draft_is_validation_error() {
    let (_transport, session) = loaded_session(10.0).await;
    let err = session.submit_comment().await.unwrap_err();
    assert!(matches!(err, ArchiveError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Single in-flight submission per session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_submission_rejected_not_queued() {
    let (transport, session) = loaded_session(10.0).await;
    transport.on_post("/add-comment", 200, confirmed_reply(1.0));
    session.set_draft(draft("held in flight")).expect("draft");

    transport.engage_gate();
    let in_flight = {
        let session = session.clone();
        tokio::spawn(async move { session.submit_comment().await })
    };
    while session.state() != SubmissionState::Submitting {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let err = session.submit_comment().await.unwrap_err();
    assert!(matches!(err, ArchiveError::SubmissionInFlight));
    let err = session.set_draft(draft("meddling")).unwrap_err();
    assert!(matches!(err, ArchiveError::SubmissionInFlight));

    transport.release_gate();
    let state = in_flight.await.expect("join").expect("submit");
    assert_eq!(state, SubmissionState::Confirmed);

    // Terminal state accepts a new submission again.
    assert!(session.set_draft(draft("next round")).is_ok());
}

//! Check-in log and its per-participant cap.

mod common;

use crate::common::{create_participant, TestHarness};
use axum::http::StatusCode;
use server_core::common::ParticipantId;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn third_checkin_is_refused(ctx: &TestHarness) {
    let participant = create_participant(&ctx.db_pool, "Helena").await.unwrap();
    let api = ctx.api_as("1234");
    let uri = format!("/checkins/{}", participant.id);

    let first = api.post_empty(&uri).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["staff"], "1234@example.org");

    assert_eq!(api.post_empty(&uri).await.status, StatusCode::CREATED);

    let third = api.post_empty(&uri).await;
    assert_eq!(third.status, StatusCode::BAD_REQUEST);

    let history = api
        .get(&format!("/checkins/participant/{}", participant.id))
        .await;
    assert_eq!(history.body.as_array().unwrap().len(), 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn status_tracks_remaining(ctx: &TestHarness) {
    let participant = create_participant(&ctx.db_pool, "Igor").await.unwrap();
    let api = ctx.api_as("1234");
    let status_uri = format!("/checkins/status/{}", participant.id);

    let before = api.get(&status_uri).await;
    assert_eq!(before.status, StatusCode::OK);
    assert_eq!(before.body["total_checkins"], 0);
    assert_eq!(before.body["remaining_checkins"], 2);
    assert_eq!(before.body["can_check_in"], true);

    api.post_empty(&format!("/checkins/{}", participant.id)).await;
    api.post_empty(&format!("/checkins/{}", participant.id)).await;

    let after = api.get(&status_uri).await;
    assert_eq!(after.body["total_checkins"], 2);
    assert_eq!(after.body["remaining_checkins"], 0);
    assert_eq!(after.body["can_check_in"], false);
    assert_eq!(after.body["participant"]["id"], participant.id.to_string());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_checkins_respect_cap(ctx: &TestHarness) {
    let participant = create_participant(&ctx.db_pool, "Julia").await.unwrap();
    let uri = format!("/checkins/{}", participant.id);

    let (a, b, c) = (ctx.api_as("1234"), ctx.api_as("2345"), ctx.api_as("3456"));
    let (ra, rb, rc) = tokio::join!(a.post_empty(&uri), b.post_empty(&uri), c.post_empty(&uri));

    let created = [ra.status, rb.status, rc.status]
        .iter()
        .filter(|s| **s == StatusCode::CREATED)
        .count();
    assert_eq!(created, 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_participant_is_not_found(ctx: &TestHarness) {
    let api = ctx.api_as("1234");
    let id = ParticipantId::new();

    assert_eq!(
        api.post_empty(&format!("/checkins/{}", id)).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        api.get(&format!("/checkins/status/{}", id)).await.status,
        StatusCode::NOT_FOUND
    );
}

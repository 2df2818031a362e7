//! Auto-leave policies under controlled time: solo timeout and the
//! max-duration budget.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod support;

use call_coordinator::session::SessionPhase;
use call_coordinator::transport::TransportEvent;
use common::types::RoomIntent;
use coordinator_test_utils::{
    local_participant, remote_participant, MockControlPlane, MockTransport,
};
use std::sync::Arc;
use support::{advance_seconds, spawn_session, test_config, wait_for_phase};

#[tokio::test(start_paused = true)]
async fn test_solo_timeout_leaves_exactly_once() {
    let transport = Arc::new(MockTransport::new());
    transport.set_participants(vec![local_participant("local-1")]);
    let control = Arc::new(MockControlPlane::new());
    let config = test_config(&[("CALL_SOLO_TIMEOUT_SECONDS", "10")]);
    let (handle, _task) = spawn_session(config, &transport, &control, RoomIntent::Start);

    handle.start().await.unwrap();
    wait_for_phase(&handle, SessionPhase::Joined).await;

    advance_seconds(9).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Joined);
    assert_eq!(snapshot.waiting_seconds, 9);

    advance_seconds(1).await;
    wait_for_phase(&handle, SessionPhase::Left).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.waiting_seconds, 10);
    assert!(snapshot.auto_navigate_on_leave);
    assert_eq!(control.end_calls(), 1);
    assert_eq!(transport.leave_calls(), 1);

    // More time passing must not trigger a second leave.
    advance_seconds(20).await;
    assert_eq!(control.end_calls(), 1);
    assert_eq!(transport.leave_calls(), 1);

    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_remote_arrival_stops_the_waiting_clock() {
    let transport = Arc::new(MockTransport::new());
    transport.set_participants(vec![local_participant("local-1")]);
    let control = Arc::new(MockControlPlane::new());
    let config = test_config(&[("CALL_SOLO_TIMEOUT_SECONDS", "10")]);
    let (handle, _task) = spawn_session(config, &transport, &control, RoomIntent::Start);

    handle.start().await.unwrap();
    wait_for_phase(&handle, SessionPhase::Joined).await;

    advance_seconds(5).await;

    let peer = remote_participant("remote-1", "peer-a", "Alice");
    transport.set_participants(vec![local_participant("local-1"), peer.clone()]);
    transport.push_event(TransportEvent::ParticipantJoined { participant: peer });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    // Well past the solo threshold, but no longer alone.
    advance_seconds(30).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Joined);
    assert_eq!(snapshot.waiting_seconds, 5);
    assert_eq!(snapshot.duration_seconds, 30);
    assert_eq!(control.end_calls(), 0);

    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_duration_counts_only_with_company() {
    let transport = Arc::new(MockTransport::new());
    transport.set_participants(vec![local_participant("local-1")]);
    let control = Arc::new(MockControlPlane::new());
    let config = test_config(&[("CALL_SOLO_TIMEOUT_SECONDS", "9999")]);
    let (handle, _task) = spawn_session(config, &transport, &control, RoomIntent::Start);

    handle.start().await.unwrap();
    wait_for_phase(&handle, SessionPhase::Joined).await;

    advance_seconds(7).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.duration_seconds, 0);
    assert_eq!(snapshot.waiting_seconds, 7);

    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_max_duration_budget_cuts_the_call_off() {
    let transport = Arc::new(MockTransport::new());
    transport.set_participants(vec![local_participant("local-1")]);
    let control = Arc::new(MockControlPlane::new());
    let config = test_config(&[
        ("CALL_SOLO_TIMEOUT_SECONDS", "9999"),
        ("CALL_MAX_DURATION_SECONDS", "30"),
    ]);
    let (handle, _task) = spawn_session(config, &transport, &control, RoomIntent::Start);

    handle.start().await.unwrap();
    wait_for_phase(&handle, SessionPhase::Joined).await;

    // The budget is checked on a coarse 10s poll, so the cutoff lands at
    // the first poll after the threshold.
    advance_seconds(45).await;
    wait_for_phase(&handle, SessionPhase::Left).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.auto_navigate_on_leave);
    assert_eq!(control.end_calls(), 1);
    assert_eq!(transport.leave_calls(), 1);

    handle.cancel();
}

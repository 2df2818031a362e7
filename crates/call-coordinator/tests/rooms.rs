#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use call_coordinator::errors::CallError;
use call_coordinator::rooms::RoomAcquirer;
use common::types::{ConversationId, RoomIntent};
use coordinator_test_utils::MockControlPlane;
use std::sync::Arc;

fn acquirer(control: Arc<MockControlPlane>) -> RoomAcquirer {
    RoomAcquirer::new(control, ".daily.co")
}

#[tokio::test]
async fn test_concurrent_acquires_collapse_to_one_remote_call() {
    let control = Arc::new(MockControlPlane::new());
    // Hold the remote call open so all three acquires overlap in flight.
    control.delay_creates(std::time::Duration::from_millis(20));
    let rooms = acquirer(Arc::clone(&control));
    let conversation = ConversationId::from("conv-1");

    let (a, b, c) = tokio::join!(
        rooms.acquire(&conversation, RoomIntent::Start, false),
        rooms.acquire(&conversation, RoomIntent::Start, false),
        rooms.acquire(&conversation, RoomIntent::Start, false),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    let c = c.unwrap();

    assert_eq!(control.create_calls(), 1);
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn test_distinct_keys_do_not_collapse() {
    let control = Arc::new(MockControlPlane::new());
    let rooms = acquirer(Arc::clone(&control));
    let conversation = ConversationId::from("conv-1");

    let (a, b) = tokio::join!(
        rooms.acquire(&conversation, RoomIntent::Start, false),
        rooms.acquire(&conversation, RoomIntent::Start, true),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(control.create_calls(), 2);
}

#[tokio::test]
async fn test_forced_acquire_returns_a_different_room() {
    let control = Arc::new(MockControlPlane::new());
    let rooms = acquirer(Arc::clone(&control));
    let conversation = ConversationId::from("conv-1");

    let first = rooms
        .acquire(&conversation, RoomIntent::Start, false)
        .await
        .unwrap();
    let second = rooms
        .acquire(&conversation, RoomIntent::Start, true)
        .await
        .unwrap();

    assert_ne!(first.url, second.url);
}

#[tokio::test]
async fn test_insecure_scheme_is_rejected() {
    let control = Arc::new(MockControlPlane::new());
    control.set_room_url("http://rooms.daily.co/conv-1");
    let rooms = acquirer(Arc::clone(&control));

    let result = rooms
        .acquire(&ConversationId::from("conv-1"), RoomIntent::Start, false)
        .await;

    assert!(matches!(result, Err(CallError::InvalidRoomUrl(_))));
}

#[tokio::test]
async fn test_foreign_host_is_rejected() {
    let control = Arc::new(MockControlPlane::new());
    control.set_room_url("https://rooms.attacker.example/conv-1");
    let rooms = acquirer(Arc::clone(&control));

    let result = rooms
        .acquire(&ConversationId::from("conv-1"), RoomIntent::Start, false)
        .await;

    assert!(matches!(result, Err(CallError::InvalidRoomUrl(_))));
}

#[tokio::test]
async fn test_backend_rejection_carries_error_code() {
    let control = Arc::new(MockControlPlane::new());
    control.reject_next_create("unauthorized");
    let rooms = acquirer(Arc::clone(&control));

    let result = rooms
        .acquire(&ConversationId::from("conv-1"), RoomIntent::Join, false)
        .await;

    match result {
        Err(err @ CallError::Control(_)) => {
            assert_eq!(err.user_message(), "You are not allowed to join this call.");
        }
        other => panic!("expected control-plane rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_acquire_can_be_retried() {
    let control = Arc::new(MockControlPlane::new());
    control.reject_next_create("room_create_failed");
    let rooms = acquirer(Arc::clone(&control));
    let conversation = ConversationId::from("conv-1");

    let first = rooms
        .acquire(&conversation, RoomIntent::Start, false)
        .await;
    assert!(first.is_err());

    let second = rooms
        .acquire(&conversation, RoomIntent::Start, false)
        .await;
    assert!(second.is_ok());
    assert_eq!(control.create_calls(), 2);
}

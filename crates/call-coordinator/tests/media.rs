#![allow(clippy::unwrap_used, clippy::expect_used)]

use call_coordinator::media::MediaSync;
use call_coordinator::transport::CallTransport;
use coordinator_test_utils::{local_participant, MockTransport};
use std::sync::Arc;

#[tokio::test]
async fn test_toggle_reflects_actual_state_on_success() {
    let transport = Arc::new(MockTransport::new());
    transport.set_participants(vec![local_participant("local-1")]);
    let mut media = MediaSync::new(transport);

    let actual = media.set_camera(true).await.unwrap();
    assert!(actual);
    assert!(media.camera_on());
}

#[tokio::test]
async fn test_rejected_toggle_reports_reality_not_intent() {
    let transport = Arc::new(MockTransport::new());
    transport.set_participants(vec![local_participant("local-1")]);
    transport.reject_video_toggles("camera busy");
    let mut media = MediaSync::new(Arc::clone(&transport) as Arc<dyn CallTransport>);

    // Requested on, device refused: the exposed state must be off.
    let actual = media.set_camera(true).await.unwrap();
    assert!(!actual);
    assert!(!media.camera_on());
}

#[tokio::test]
async fn test_refresh_converges_after_external_change() {
    let transport = Arc::new(MockTransport::new());
    let mut enabled = local_participant("local-1");
    enabled.video_enabled = true;
    enabled.audio_enabled = true;
    transport.set_participants(vec![enabled.clone()]);
    let mut media = MediaSync::new(Arc::clone(&transport) as Arc<dyn CallTransport>);

    media.refresh();
    assert!(media.camera_on());
    assert!(media.microphone_on());

    // Device failure turns the channels off behind our back.
    let mut disabled = enabled;
    disabled.video_enabled = false;
    disabled.audio_enabled = false;
    transport.set_participants(vec![disabled]);

    media.refresh();
    assert!(!media.camera_on());
    assert!(!media.microphone_on());
}

#[tokio::test]
async fn test_microphone_toggle_round_trip() {
    let transport = Arc::new(MockTransport::new());
    transport.set_participants(vec![local_participant("local-1")]);
    let mut media = MediaSync::new(transport);

    assert!(media.set_microphone(true).await.unwrap());
    assert!(media.microphone_on());
    assert!(!media.set_microphone(false).await.unwrap());
    assert!(!media.microphone_on());
}

//! Raw participant fixtures.

use call_coordinator::transport::RawParticipant;

/// A local participant with identity and name, channels off.
#[must_use]
pub fn local_participant(session_id: &str) -> RawParticipant {
    RawParticipant {
        session_id: session_id.to_string(),
        local: true,
        app_user_id: Some("local-user".to_string()),
        user_name: Some("Me".to_string()),
        ..RawParticipant::default()
    }
}

/// A remote participant with the given identity and display name, both
/// channels live.
#[must_use]
pub fn remote_participant(session_id: &str, identity: &str, name: &str) -> RawParticipant {
    RawParticipant {
        session_id: session_id.to_string(),
        local: false,
        app_user_id: Some(identity.to_string()),
        user_name: Some(name.to_string()),
        video_track_id: Some(format!("video-{session_id}")),
        audio_track_id: Some(format!("audio-{session_id}")),
        video_enabled: true,
        audio_enabled: true,
        ..RawParticipant::default()
    }
}

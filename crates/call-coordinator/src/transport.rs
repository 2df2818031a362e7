//! The real-time media transport seam.
//!
//! The coordinator never talks to a transport SDK directly; it consumes this
//! narrow trait. Production code wraps the vendor SDK behind it, and tests
//! substitute a scriptable mock. Event delivery uses a broadcast channel so
//! the session actor subscribes once at spawn and the subscription drops
//! with the actor.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Media channel kinds reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Coarse transport-level meeting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingState {
    New,
    Joining,
    Joined,
    Left,
    Error,
}

/// Parameters for joining a room.
#[derive(Debug, Clone)]
pub struct JoinParams {
    /// Validated room URL.
    pub url: String,
    /// Name shown to other participants.
    pub display_name: String,
    /// Stable application user id, carried through the transport so peers
    /// can deduplicate this participant across reconnects.
    pub identity: String,
}

/// One participant record as the transport reports it.
///
/// Loosely shaped on purpose: every identity field may be absent or empty,
/// and duplicate or ghost records do occur. Normalization into the strict
/// [`crate::roster::Participant`] happens at the reconciliation boundary;
/// nothing downstream branches on "maybe this field exists".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParticipant {
    /// Transport session id; unique per connection, not per user.
    pub session_id: String,
    /// Whether this record describes the local participant.
    pub local: bool,
    /// Stable application user id, if the join carried one.
    pub app_user_id: Option<String>,
    /// Transport-assigned user id, if any.
    pub transport_user_id: Option<String>,
    /// Display name, if any.
    pub user_name: Option<String>,
    /// Live video track identifier, if a track is attached.
    pub video_track_id: Option<String>,
    /// Live audio track identifier, if a track is attached.
    pub audio_track_id: Option<String>,
    /// Whether the video channel is reported on.
    pub video_enabled: bool,
    /// Whether the audio channel is reported on.
    pub audio_enabled: bool,
}

/// Events emitted by the transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Joining,
    Joined,
    Left,
    Error { message: String },
    ParticipantJoined { participant: RawParticipant },
    ParticipantUpdated { participant: RawParticipant },
    ParticipantLeft { session_id: String },
    TrackStarted { session_id: String, kind: TrackKind },
    TrackStopped { session_id: String, kind: TrackKind },
    CameraError { message: String },
}

/// Transport operation failures.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The room this join targeted has expired.
    #[error("room expired")]
    RoomExpired,

    /// The room this join targeted does not exist.
    #[error("room not found")]
    RoomNotFound,

    /// A camera/microphone device failure. Degraded continuation, never
    /// fatal to the call.
    #[error("device error: {0}")]
    Device(String),

    /// Any other transport failure.
    #[error("transport failure: {0}")]
    Failed(String),
}

impl TransportError {
    /// Whether a freshly acquired room could recover this join failure.
    #[must_use]
    pub fn is_stale_room(&self) -> bool {
        matches!(
            self,
            TransportError::RoomExpired | TransportError::RoomNotFound
        )
    }
}

/// The transport operations the coordinator depends on.
#[async_trait]
pub trait CallTransport: Send + Sync {
    /// Join the room at `params.url`. Completion means the join was
    /// dispatched; the `Joined` event confirms it.
    async fn join(&self, params: JoinParams) -> Result<(), TransportError>;

    /// Leave the current room and release local media devices.
    async fn leave(&self) -> Result<(), TransportError>;

    /// Request the local video channel on or off.
    async fn set_local_video(&self, enabled: bool) -> Result<(), TransportError>;

    /// Request the local audio channel on or off.
    async fn set_local_audio(&self, enabled: bool) -> Result<(), TransportError>;

    /// Current raw participant snapshot, duplicates and ghosts included.
    fn participants(&self) -> Vec<RawParticipant>;

    /// Current coarse meeting state.
    fn meeting_state(&self) -> MeetingState;

    /// Subscribe to transport events.
    fn events(&self) -> broadcast::Receiver<TransportEvent>;
}

//! Local media state synchronization.
//!
//! The camera/microphone flags shown to the user are never the requested
//! values. Every toggle goes: request the transport, await completion,
//! re-read what the transport actually reports for the local participant,
//! and expose that. Device failures leave the call running without the
//! channel; the flags still reflect reality.

use crate::errors::CallError;
use crate::roster::canonical_local;
use crate::transport::{CallTransport, TrackKind, TransportError};
use std::sync::Arc;
use tracing::warn;

/// Single source of truth for local camera/microphone state.
pub struct MediaSync {
    transport: Arc<dyn CallTransport>,
    camera_on: bool,
    microphone_on: bool,
}

impl MediaSync {
    #[must_use]
    pub fn new(transport: Arc<dyn CallTransport>) -> Self {
        Self {
            transport,
            camera_on: false,
            microphone_on: false,
        }
    }

    #[must_use]
    pub fn camera_on(&self) -> bool {
        self.camera_on
    }

    #[must_use]
    pub fn microphone_on(&self) -> bool {
        self.microphone_on
    }

    /// Request the camera on or off and return the *actual* resulting state.
    pub async fn set_camera(&mut self, desired: bool) -> Result<bool, CallError> {
        self.set_channel(TrackKind::Video, desired).await
    }

    /// Request the microphone on or off and return the *actual* resulting
    /// state.
    pub async fn set_microphone(&mut self, desired: bool) -> Result<bool, CallError> {
        self.set_channel(TrackKind::Audio, desired).await
    }

    async fn set_channel(&mut self, kind: TrackKind, desired: bool) -> Result<bool, CallError> {
        let request = match kind {
            TrackKind::Video => self.transport.set_local_video(desired).await,
            TrackKind::Audio => self.transport.set_local_audio(desired).await,
        };

        match request {
            Ok(()) => {}
            Err(TransportError::Device(message)) => {
                // Degraded continuation: the call goes on without the
                // channel, and the re-read below reflects that.
                warn!(
                    target: "call.media",
                    kind = ?kind,
                    requested = desired,
                    error = %message,
                    "Device rejected media toggle"
                );
            }
            Err(other) => return Err(other.into()),
        }

        let actual = self.read_actual(kind);
        if actual != desired {
            warn!(
                target: "call.media",
                kind = ?kind,
                requested = desired,
                actual,
                "Media state diverged from request"
            );
        }

        match kind {
            TrackKind::Video => self.camera_on = actual,
            TrackKind::Audio => self.microphone_on = actual,
        }
        Ok(actual)
    }

    /// Re-read actual local state from the transport.
    ///
    /// Called on every local track event and on device-error events so the
    /// flags cannot drift from what is really being sent.
    pub fn refresh(&mut self) {
        self.camera_on = self.read_actual(TrackKind::Video);
        self.microphone_on = self.read_actual(TrackKind::Audio);
    }

    fn read_actual(&self, kind: TrackKind) -> bool {
        let snapshot = self.transport.participants();
        canonical_local(&snapshot)
            .map(|local| match kind {
                TrackKind::Video => local.video_enabled,
                TrackKind::Audio => local.audio_enabled,
            })
            .unwrap_or(false)
    }
}


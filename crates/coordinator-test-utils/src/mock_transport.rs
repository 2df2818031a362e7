//! Mock transport for coordinator testing.

use async_trait::async_trait;
use call_coordinator::transport::{
    CallTransport, JoinParams, MeetingState, RawParticipant, TransportError, TransportEvent,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
struct Inner {
    participants: Vec<RawParticipant>,
    meeting_state: MeetingState,
    join_calls: u32,
    leave_calls: u32,
    join_results: VecDeque<Result<(), TransportError>>,
    joined_urls: Vec<String>,
    video_toggle_error: Option<String>,
    audio_toggle_error: Option<String>,
    auto_join_events: bool,
}

/// A scriptable [`CallTransport`].
///
/// By default a `join` succeeds and emits `Joining` + `Joined`; a toggle
/// mutates the local participant record so the coordinator's re-read sees
/// the new state. Tests script deviations: queued join failures, toggle
/// rejections that leave the snapshot untouched, and arbitrary injected
/// events.
pub struct MockTransport {
    inner: Mutex<Inner>,
    events_tx: broadcast::Sender<TransportEvent>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                participants: Vec::new(),
                meeting_state: MeetingState::New,
                join_calls: 0,
                leave_calls: 0,
                join_results: VecDeque::new(),
                joined_urls: Vec::new(),
                video_toggle_error: None,
                audio_toggle_error: None,
                auto_join_events: true,
            }),
            events_tx,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Replace the raw participant snapshot.
    pub fn set_participants(&self, participants: Vec<RawParticipant>) {
        self.lock().participants = participants;
    }

    /// Inject a transport event.
    pub fn push_event(&self, event: TransportEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Queue a result for the next `join` call.
    pub fn script_join_result(&self, result: Result<(), TransportError>) {
        self.lock().join_results.push_back(result);
    }

    /// Make every video toggle fail with a device error, leaving the
    /// snapshot untouched.
    pub fn reject_video_toggles(&self, message: &str) {
        self.lock().video_toggle_error = Some(message.to_string());
    }

    /// Make every audio toggle fail with a device error, leaving the
    /// snapshot untouched.
    pub fn reject_audio_toggles(&self, message: &str) {
        self.lock().audio_toggle_error = Some(message.to_string());
    }

    /// Suppress the automatic `Joining`/`Joined` events on successful join.
    pub fn disable_auto_join_events(&self) {
        self.lock().auto_join_events = false;
    }

    #[must_use]
    pub fn join_calls(&self) -> u32 {
        self.lock().join_calls
    }

    #[must_use]
    pub fn leave_calls(&self) -> u32 {
        self.lock().leave_calls
    }

    /// URLs passed to successful `join` calls, in order.
    #[must_use]
    pub fn joined_urls(&self) -> Vec<String> {
        self.lock().joined_urls.clone()
    }
}

#[async_trait]
impl CallTransport for MockTransport {
    async fn join(&self, params: JoinParams) -> Result<(), TransportError> {
        let (result, emit_events) = {
            let mut inner = self.lock();
            inner.join_calls += 1;
            let result = inner.join_results.pop_front().unwrap_or(Ok(()));
            if result.is_ok() {
                inner.meeting_state = MeetingState::Joined;
                inner.joined_urls.push(params.url.clone());
            }
            (result, inner.auto_join_events)
        };

        if result.is_ok() && emit_events {
            let _ = self.events_tx.send(TransportEvent::Joining);
            let _ = self.events_tx.send(TransportEvent::Joined);
        }
        result
    }

    async fn leave(&self) -> Result<(), TransportError> {
        {
            let mut inner = self.lock();
            inner.leave_calls += 1;
            inner.meeting_state = MeetingState::Left;
        }
        let _ = self.events_tx.send(TransportEvent::Left);
        Ok(())
    }

    async fn set_local_video(&self, enabled: bool) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if let Some(message) = inner.video_toggle_error.clone() {
            return Err(TransportError::Device(message));
        }
        if let Some(local) = inner.participants.iter_mut().find(|p| p.local) {
            local.video_enabled = enabled;
            if enabled && local.video_track_id.is_none() {
                local.video_track_id = Some(format!("video-{}", local.session_id));
            }
        }
        Ok(())
    }

    async fn set_local_audio(&self, enabled: bool) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if let Some(message) = inner.audio_toggle_error.clone() {
            return Err(TransportError::Device(message));
        }
        if let Some(local) = inner.participants.iter_mut().find(|p| p.local) {
            local.audio_enabled = enabled;
            if enabled && local.audio_track_id.is_none() {
                local.audio_track_id = Some(format!("audio-{}", local.session_id));
            }
        }
        Ok(())
    }

    fn participants(&self) -> Vec<RawParticipant> {
        self.lock().participants.clone()
    }

    fn meeting_state(&self) -> MeetingState {
        self.lock().meeting_state
    }

    fn events(&self) -> broadcast::Receiver<TransportEvent> {
        self.events_tx.subscribe()
    }
}

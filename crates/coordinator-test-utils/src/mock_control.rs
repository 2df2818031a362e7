//! Mock control plane for coordinator testing.

use async_trait::async_trait;
use call_coordinator::control::{
    ControlPlane, ControlPlaneError, CreateRoomResponse, RoomDescriptor,
};
use common::types::{ConversationId, EndReason, RoomIntent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    room_counter: u32,
    room_url_override: Option<String>,
    create_rejections: VecDeque<String>,
    end_failures: u32,
    end_call_delay: Option<Duration>,
    create_delay: Option<Duration>,
}

/// A scriptable [`ControlPlane`] with call counters.
///
/// Every `create_room` allocates a fresh room name/URL (so forced
/// reacquisition observably differs), counts the call, and succeeds unless
/// a rejection code was queued. `end_call` succeeds unless failures were
/// queued. The detached dispatch only counts; there is nothing to await.
#[derive(Default)]
pub struct MockControlPlane {
    create_calls: AtomicU32,
    end_calls: AtomicU32,
    detached_calls: AtomicU32,
    inner: Mutex<Inner>,
}

impl MockControlPlane {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Serve this exact room URL instead of generated ones.
    pub fn set_room_url(&self, url: &str) {
        self.lock().room_url_override = Some(url.to_string());
    }

    /// Queue a rejection code for the next `create_room`.
    pub fn reject_next_create(&self, code: &str) {
        self.lock().create_rejections.push_back(code.to_string());
    }

    /// Make the next `end_call` fail with an HTTP error.
    pub fn fail_next_end_call(&self) {
        self.lock().end_failures += 1;
    }

    /// Delay `end_call` completions, widening concurrency windows in tests.
    pub fn delay_end_calls(&self, delay: Duration) {
        self.lock().end_call_delay = Some(delay);
    }

    /// Delay `create_room` completions, widening concurrency windows in
    /// tests.
    pub fn delay_creates(&self, delay: Duration) {
        self.lock().create_delay = Some(delay);
    }

    #[must_use]
    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn end_calls(&self) -> u32 {
        self.end_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn detached_calls(&self) -> u32 {
        self.detached_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn create_room(
        &self,
        conversation_id: &ConversationId,
        _intent: RoomIntent,
        _force_new: bool,
    ) -> Result<CreateRoomResponse, ControlPlaneError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let (delay, rejection, room) = {
            let mut inner = self.lock();
            let delay = inner.create_delay;
            let rejection = inner.create_rejections.pop_front();
            inner.room_counter += 1;
            let url = inner.room_url_override.clone().unwrap_or_else(|| {
                format!(
                    "https://rooms.daily.co/{}-{}",
                    conversation_id.as_str(),
                    inner.room_counter
                )
            });
            let room = RoomDescriptor {
                name: format!("{}-{}", conversation_id.as_str(), inner.room_counter),
                url,
            };
            (delay, rejection, room)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(code) = rejection {
            return Ok(CreateRoomResponse {
                success: false,
                room: None,
                reused: false,
                active_call: false,
                error: Some(code),
            });
        }

        Ok(CreateRoomResponse {
            success: true,
            room: Some(room),
            reused: false,
            active_call: false,
            error: None,
        })
    }

    async fn end_call(
        &self,
        _conversation_id: &ConversationId,
        _reason: EndReason,
    ) -> Result<(), ControlPlaneError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);

        let (delay, fail) = {
            let mut inner = self.lock();
            let fail = inner.end_failures > 0;
            if fail {
                inner.end_failures -= 1;
            }
            (inner.end_call_delay, fail)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if fail {
            return Err(ControlPlaneError::Http("scripted end_call failure".to_string()));
        }
        Ok(())
    }

    fn end_call_detached(&self, _conversation_id: &ConversationId, _reason: EndReason) {
        self.detached_calls.fetch_add(1, Ordering::SeqCst);
    }
}

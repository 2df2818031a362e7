//! Track-event deduplication and rebuild coalescing.
//!
//! Renegotiation produces bursts of identical track started/stopped events.
//! [`TrackStateTracker`] keeps the last known per-channel boolean per
//! session and drops events that change nothing. Real transitions feed the
//! [`RebuildScheduler`], which coalesces them into one roster rebuild per
//! window; join/leave events bypass the window entirely.
//!
//! Both types are owned by one session and dropped with it.

use crate::transport::TrackKind;
use std::collections::HashMap;
use tokio::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy)]
struct ChannelState {
    video: bool,
    audio: bool,
}

/// Last observed per-channel track state, per transport session.
#[derive(Debug, Default)]
pub struct TrackStateTracker {
    states: HashMap<String, ChannelState>,
}

impl TrackStateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a track event. Returns whether it was a real transition;
    /// no-change events return false and must be dropped by the caller.
    pub fn observe(&mut self, session_id: &str, kind: TrackKind, live: bool) -> bool {
        let entry = self.states.entry(session_id.to_string()).or_default();
        let slot = match kind {
            TrackKind::Video => &mut entry.video,
            TrackKind::Audio => &mut entry.audio,
        };

        if *slot == live {
            return false;
        }
        *slot = live;
        true
    }

    /// Drop tracked state for a departed participant.
    pub fn forget(&mut self, session_id: &str) {
        self.states.remove(session_id);
    }

    /// Drop all tracked state. Called when the session ends.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Coalesces roster rebuild requests into a bounded window.
///
/// Driven by `tokio::time`, so paused-time tests control it exactly.
#[derive(Debug)]
pub struct RebuildScheduler {
    window: Duration,
    deadline: Option<Instant>,
}

impl RebuildScheduler {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Request a rebuild right now (join/leave responsiveness). Overrides
    /// any pending debounced deadline.
    pub fn request_immediate(&mut self) {
        self.deadline = Some(Instant::now());
    }

    /// Request a rebuild at the end of the coalescing window. Requests that
    /// land inside an open window fold into it.
    pub fn request_debounced(&mut self) {
        let due = Instant::now() + self.window;
        match self.deadline {
            Some(existing) if existing <= due => {}
            _ => self.deadline = Some(due),
        }
    }

    /// Whether a rebuild is pending.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending rebuild fires. Returns now when nothing is pending;
    /// callers gate on [`Self::is_scheduled`].
    #[must_use]
    pub fn fire_at(&self) -> Instant {
        self.deadline.unwrap_or_else(Instant::now)
    }

    /// Consume the pending request.
    pub fn clear(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_started_event_is_a_transition() {
        let mut tracker = TrackStateTracker::new();
        assert!(tracker.observe("s1", TrackKind::Video, true));
    }

    #[test]
    fn test_repeated_events_are_dropped() {
        let mut tracker = TrackStateTracker::new();
        assert!(tracker.observe("s1", TrackKind::Video, true));
        assert!(!tracker.observe("s1", TrackKind::Video, true));
        assert!(!tracker.observe("s1", TrackKind::Video, true));
        assert!(tracker.observe("s1", TrackKind::Video, false));
        assert!(!tracker.observe("s1", TrackKind::Video, false));
    }

    #[test]
    fn test_stop_without_prior_start_is_noise() {
        // Channels start from off; a stop for an unknown session changes
        // nothing and must be absorbed.
        let mut tracker = TrackStateTracker::new();
        assert!(!tracker.observe("s1", TrackKind::Audio, false));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut tracker = TrackStateTracker::new();
        assert!(tracker.observe("s1", TrackKind::Video, true));
        assert!(tracker.observe("s1", TrackKind::Audio, true));
        assert!(!tracker.observe("s1", TrackKind::Video, true));
    }

    #[test]
    fn test_forget_resets_a_session() {
        let mut tracker = TrackStateTracker::new();
        assert!(tracker.observe("s1", TrackKind::Video, true));
        tracker.forget("s1");
        assert!(tracker.observe("s1", TrackKind::Video, true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_requests_coalesce() {
        let mut scheduler = RebuildScheduler::new(Duration::from_millis(50));

        scheduler.request_debounced();
        let first_deadline = scheduler.fire_at();

        tokio::time::advance(Duration::from_millis(20)).await;
        scheduler.request_debounced();

        // The second request folded into the open window.
        assert_eq!(scheduler.fire_at(), first_deadline);
        assert!(scheduler.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_overrides_debounced() {
        let mut scheduler = RebuildScheduler::new(Duration::from_millis(50));

        scheduler.request_debounced();
        scheduler.request_immediate();

        assert_eq!(scheduler.fire_at(), Instant::now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_consumes_the_request() {
        let mut scheduler = RebuildScheduler::new(Duration::from_millis(50));
        scheduler.request_debounced();
        scheduler.clear();
        assert!(!scheduler.is_scheduled());
    }
}

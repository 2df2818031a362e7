//! The call session actor.
//!
//! One actor owns one call attempt: it acquires the room, drives the join,
//! consumes transport events into the roster and media state, runs the
//! auto-leave policies, and funnels every exit path through a single
//! shutdown routine so the transport handle is always released and the
//! server-side call is terminated exactly once.

use crate::config::CallConfig;
use crate::control::ControlPlane;
use crate::errors::CallError;
use crate::media::MediaSync;
use crate::notifications::{NotificationKind, NotificationQueue};
use crate::rooms::{Room, RoomAcquirer};
use crate::roster::{canonical_local, reconcile, Roster};
use crate::session::messages::{CallSnapshot, SessionCommand, SessionPhase};
use crate::session::termination::TerminationCoordinator;
use crate::session::timers::SessionTimers;
use crate::tracks::{RebuildScheduler, TrackStateTracker};
use crate::transport::{
    CallTransport, JoinParams, MeetingState, TrackKind, TransportError, TransportEvent,
};
use chrono::{DateTime, Utc};
use common::types::{ConversationId, EndReason, RoomIntent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Channel buffer size for the session mailbox.
const SESSION_CHANNEL_BUFFER: usize = 64;

/// Period of the timer tick driving the waiting/duration counters.
const SECOND_TICK: Duration = Duration::from_secs(1);

/// Handle to a running call session actor.
#[derive(Clone)]
pub struct CallSessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    cancel_token: CancellationToken,
    conversation_id: ConversationId,
}

impl CallSessionHandle {
    /// Conversation this session belongs to.
    #[must_use]
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Acquire a room and join the call.
    pub async fn start(&self) -> Result<(), CallError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Start { respond_to: tx })
            .await
            .map_err(|_| CallError::SessionClosed)?;
        rx.await.map_err(|_| CallError::SessionClosed)?
    }

    /// Toggle the camera; resolves to the actual resulting state.
    pub async fn toggle_camera(&self) -> Result<bool, CallError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::ToggleCamera { respond_to: tx })
            .await
            .map_err(|_| CallError::SessionClosed)?;
        rx.await.map_err(|_| CallError::SessionClosed)?
    }

    /// Toggle the microphone; resolves to the actual resulting state.
    pub async fn toggle_microphone(&self) -> Result<bool, CallError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::ToggleMicrophone { respond_to: tx })
            .await
            .map_err(|_| CallError::SessionClosed)?;
        rx.await.map_err(|_| CallError::SessionClosed)?
    }

    /// Leave the call.
    pub async fn leave(&self, reason: EndReason) -> Result<(), CallError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Leave {
                reason,
                respond_to: tx,
            })
            .await
            .map_err(|_| CallError::SessionClosed)?;
        rx.await.map_err(|_| CallError::SessionClosed)?
    }

    /// Signal that the hosting page was hidden (not a back/forward-cache
    /// restore).
    pub async fn page_hidden(&self) -> Result<(), CallError> {
        self.sender
            .send(SessionCommand::PageHidden)
            .await
            .map_err(|_| CallError::SessionClosed)
    }

    /// Signal the final before-unload; fallback when page-hide never fired.
    pub async fn page_unload(&self) -> Result<(), CallError> {
        self.sender
            .send(SessionCommand::PageUnload)
            .await
            .map_err(|_| CallError::SessionClosed)
    }

    /// Read the current session snapshot.
    pub async fn snapshot(&self) -> Result<CallSnapshot, CallError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::GetSnapshot { respond_to: tx })
            .await
            .map_err(|_| CallError::SessionClosed)?;
        rx.await.map_err(|_| CallError::SessionClosed)
    }

    /// Cancel the session actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Whether the actor has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The call session actor implementation.
pub struct CallSessionActor {
    config: CallConfig,
    conversation_id: ConversationId,
    intent: RoomIntent,
    display_name: String,
    identity: String,
    transport: Arc<dyn CallTransport>,
    rooms: RoomAcquirer,
    termination: TerminationCoordinator,
    tracker: TrackStateTracker,
    rebuild: RebuildScheduler,
    media: MediaSync,
    notifications: NotificationQueue,
    timers: SessionTimers,
    receiver: mpsc::Receiver<SessionCommand>,
    events: broadcast::Receiver<TransportEvent>,
    events_open: bool,
    cancel_token: CancellationToken,
    phase: SessionPhase,
    roster: Roster,
    room: Option<Room>,
    joined_at: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    join_deadline: Option<Instant>,
    auto_navigate_on_leave: bool,
    error_message: Option<String>,
}

impl CallSessionActor {
    /// Spawn a session actor for one call attempt.
    ///
    /// Returns a handle and the task join handle. The actor subscribes to
    /// transport events at spawn time; the subscription drops with it.
    pub fn spawn(
        config: CallConfig,
        transport: Arc<dyn CallTransport>,
        control: Arc<dyn ControlPlane>,
        conversation_id: ConversationId,
        intent: RoomIntent,
        display_name: String,
        identity: String,
    ) -> (CallSessionHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();
        let events = transport.events();

        let actor = Self {
            rooms: RoomAcquirer::new(
                Arc::clone(&control),
                config.allowed_room_host_suffix.clone(),
            ),
            termination: TerminationCoordinator::new(control, conversation_id.clone()),
            tracker: TrackStateTracker::new(),
            rebuild: RebuildScheduler::new(config.track_debounce),
            media: MediaSync::new(Arc::clone(&transport)),
            notifications: NotificationQueue::new(
                config.notification_dedup_window,
                config.notification_display_duration,
            ),
            timers: SessionTimers::new(config.solo_timeout),
            config,
            conversation_id: conversation_id.clone(),
            intent,
            display_name,
            identity,
            transport,
            receiver,
            events,
            events_open: true,
            cancel_token: cancel_token.clone(),
            phase: SessionPhase::Created,
            roster: Roster::default(),
            room: None,
            joined_at: None,
            started_at: None,
            join_deadline: None,
            auto_navigate_on_leave: false,
            error_message: None,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = CallSessionHandle {
            sender,
            cancel_token,
            conversation_id,
        };

        (handle, task_handle)
    }

    /// Run the actor event loop.
    #[instrument(skip_all, name = "call.session", fields(conversation_id = %self.conversation_id))]
    async fn run(mut self) {
        info!(
            target: "call.session",
            intent = %self.intent,
            "Call session started"
        );

        let mut second_tick = tokio::time::interval(SECOND_TICK);
        second_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut budget_tick = tokio::time::interval(self.config.duration_poll_interval);
        budget_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    self.shutdown(EndReason::Manual, false, None).await;
                    break;
                }

                _ = second_tick.tick(), if self.phase == SessionPhase::Joined => {
                    self.timers.tick(self.roster.remote_count());
                    if self.timers.solo_timeout_reached() {
                        info!(
                            target: "call.session",
                            waiting_seconds = self.timers.waiting_seconds(),
                            "Solo timeout reached, leaving"
                        );
                        self.shutdown(EndReason::SoloTimeout, true, None).await;
                    }
                }

                _ = budget_tick.tick(), if self.phase == SessionPhase::Joined => {
                    if self.joined_elapsed() >= self.config.max_call_duration {
                        info!(
                            target: "call.session",
                            "Maximum call duration exceeded, leaving"
                        );
                        self.shutdown(EndReason::MaxDuration, true, None).await;
                    }
                }

                () = tokio::time::sleep_until(self.join_fire_at()), if self.join_deadline.is_some() => {
                    self.handle_join_timeout().await;
                }

                () = tokio::time::sleep_until(self.rebuild.fire_at()), if self.rebuild.is_scheduled() => {
                    self.rebuild.clear();
                    self.rebuild_roster();
                }

                event = self.events.recv(), if self.events_open => {
                    match event {
                        Ok(ev) => {
                            let was_joined = self.phase == SessionPhase::Joined;
                            self.handle_transport_event(ev).await;
                            if !was_joined && self.phase == SessionPhase::Joined {
                                // Count seconds from the join, not from spawn.
                                second_tick.reset();
                                budget_tick.reset();
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(
                                target: "call.session",
                                skipped,
                                "Transport events lagged, forcing rebuild"
                            );
                            self.rebuild.request_immediate();
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            self.events_open = false;
                            if !self.phase.is_terminal() {
                                let message = CallError::Transport(TransportError::Failed(
                                    "event stream closed".to_string(),
                                ))
                                .user_message()
                                .to_string();
                                self.shutdown(EndReason::Error, false, Some(message)).await;
                            }
                        }
                    }
                }

                command = self.receiver.recv() => {
                    match command {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            // All handles dropped; close out the call.
                            if !self.phase.is_terminal() {
                                self.shutdown(EndReason::Manual, false, None).await;
                            }
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "call.session",
            phase = ?self.phase,
            "Call session actor stopped"
        );
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start { respond_to } => {
                let result = self.handle_start().await;
                if let Err(err) = &result {
                    error!(
                        target: "call.session",
                        error = %err,
                        "Call start failed"
                    );
                    let message = err.user_message().to_string();
                    self.shutdown(EndReason::Error, false, Some(message)).await;
                }
                let _ = respond_to.send(result);
            }

            SessionCommand::ToggleCamera { respond_to } => {
                let desired = !self.media.camera_on();
                let result = self.media.set_camera(desired).await;
                let _ = respond_to.send(result);
            }

            SessionCommand::ToggleMicrophone { respond_to } => {
                let desired = !self.media.microphone_on();
                let result = self.media.set_microphone(desired).await;
                let _ = respond_to.send(result);
            }

            SessionCommand::Leave { reason, respond_to } => {
                self.shutdown(reason, false, None).await;
                let _ = respond_to.send(Ok(()));
            }

            SessionCommand::PageHidden | SessionCommand::PageUnload => {
                self.handle_page_close().await;
            }

            SessionCommand::GetSnapshot { respond_to } => {
                let snapshot = self.snapshot();
                let _ = respond_to.send(snapshot);
            }
        }
    }

    /// Acquire a room and join it, with the single expired-room retry.
    async fn handle_start(&mut self) -> Result<(), CallError> {
        if self.phase != SessionPhase::Created {
            return Err(CallError::Internal(
                "session was already started".to_string(),
            ));
        }

        self.phase = SessionPhase::Joining;
        self.join_deadline = Some(Instant::now() + self.config.join_timeout);

        let room = match tokio::time::timeout(self.config.join_timeout, self.join_flow()).await {
            Ok(Ok(room)) => room,
            Ok(Err(e)) => return Err(e),
            Err(_elapsed) => return Err(CallError::JoinTimeout),
        };

        debug!(
            target: "call.session",
            room = %room.name,
            reused = room.reused,
            "Join dispatched"
        );
        self.room = Some(room);
        Ok(())
    }

    async fn join_flow(&self) -> Result<Room, CallError> {
        let room = self
            .rooms
            .acquire(&self.conversation_id, self.intent, false)
            .await?;

        match self.transport.join(self.join_params(&room)).await {
            Ok(()) => Ok(room),
            Err(e) if e.is_stale_room() && self.intent == RoomIntent::Start => {
                warn!(
                    target: "call.session",
                    error = %e,
                    "Room is stale, acquiring a fresh one"
                );
                let fresh = self
                    .rooms
                    .acquire(&self.conversation_id, self.intent, true)
                    .await?;
                if fresh.url == room.url {
                    return Err(CallError::Internal(
                        "forced reacquisition returned the previous room".to_string(),
                    ));
                }
                self.transport.join(self.join_params(&fresh)).await?;
                Ok(fresh)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn join_params(&self, room: &Room) -> JoinParams {
        JoinParams {
            url: room.url.to_string(),
            display_name: self.display_name.clone(),
            identity: self.identity.clone(),
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.phase.is_terminal() {
            return;
        }

        match event {
            TransportEvent::Joining => {
                if self.phase == SessionPhase::Created {
                    self.phase = SessionPhase::Joining;
                }
            }

            TransportEvent::Joined => {
                self.join_deadline = None;
                self.phase = SessionPhase::Joined;
                self.joined_at = Some(Instant::now());
                self.started_at = Some(Utc::now());
                self.media.refresh();
                self.rebuild.request_immediate();
                info!(
                    target: "call.session",
                    room = self.room.as_ref().map_or("", |r| r.name.as_str()),
                    "Joined call room"
                );
            }

            TransportEvent::Left => {
                // Uninitiated leave: the room went away under us.
                if self.phase != SessionPhase::Leaving {
                    self.shutdown(EndReason::Manual, false, None).await;
                }
            }

            TransportEvent::Error { message } => {
                error!(
                    target: "call.session",
                    error = %message,
                    "Transport reported a fatal error"
                );
                let user_message =
                    CallError::Transport(TransportError::Failed(message))
                        .user_message()
                        .to_string();
                self.shutdown(EndReason::Error, false, Some(user_message)).await;
            }

            TransportEvent::ParticipantJoined { participant } => {
                if !participant.local {
                    if let Some(name) =
                        participant.user_name.as_deref().filter(|n| !n.is_empty())
                    {
                        self.notifications.notify(NotificationKind::Joined, name);
                    }
                }
                self.rebuild.request_immediate();
            }

            TransportEvent::ParticipantUpdated { .. } => {
                self.rebuild.request_immediate();
            }

            TransportEvent::ParticipantLeft { session_id } => {
                self.tracker.forget(&session_id);
                if let Some(name) = self
                    .roster
                    .remote_by_session(&session_id)
                    .map(|p| p.display_name.clone())
                {
                    self.notifications.notify(NotificationKind::Left, &name);
                }
                self.rebuild.request_immediate();
            }

            TransportEvent::TrackStarted { session_id, kind } => {
                self.handle_track_event(&session_id, kind, true);
            }

            TransportEvent::TrackStopped { session_id, kind } => {
                self.handle_track_event(&session_id, kind, false);
            }

            TransportEvent::CameraError { message } => {
                warn!(
                    target: "call.session",
                    error = %message,
                    "Camera device error, continuing degraded"
                );
                self.media.refresh();
            }
        }
    }

    fn handle_track_event(&mut self, session_id: &str, kind: TrackKind, live: bool) {
        if self.tracker.observe(session_id, kind, live) {
            self.rebuild.request_debounced();
        }

        let snapshot = self.transport.participants();
        let is_local = canonical_local(&snapshot)
            .map(|local| local.session_id == session_id)
            .unwrap_or(false);
        if is_local {
            self.media.refresh();
        }
    }

    async fn handle_join_timeout(&mut self) {
        self.join_deadline = None;
        if self.phase != SessionPhase::Joining {
            return;
        }
        warn!(
            target: "call.session",
            "Join watchdog fired before the transport confirmed the join"
        );
        let message = CallError::JoinTimeout.user_message().to_string();
        self.shutdown(EndReason::Error, false, Some(message)).await;
    }

    /// Page-hide and the before-unload fallback both land here; the
    /// termination record makes the second signal a no-op.
    async fn handle_page_close(&mut self) {
        self.termination.terminate(EndReason::PageClose).await;

        if !self.phase.is_terminal() {
            if self.transport.meeting_state() != MeetingState::Left {
                let _ = self.transport.leave().await;
            }
            self.tracker.clear();
            self.rebuild.clear();
            self.join_deadline = None;
            self.phase = SessionPhase::Left;
        }
    }

    fn rebuild_roster(&mut self) {
        let snapshot = self.transport.participants();
        self.roster = reconcile(&snapshot);
        debug!(
            target: "call.session",
            remotes = self.roster.remote_count(),
            "Roster rebuilt"
        );
    }

    /// Close out the session. Every exit path funnels through here:
    /// terminate exactly once, release the transport, drop tracked state.
    async fn shutdown(
        &mut self,
        reason: EndReason,
        auto_navigate: bool,
        failure: Option<String>,
    ) {
        if self.phase.is_terminal() || self.phase == SessionPhase::Leaving {
            return;
        }
        self.phase = SessionPhase::Leaving;
        self.join_deadline = None;
        if auto_navigate {
            self.auto_navigate_on_leave = true;
        }

        self.termination.terminate(reason).await;

        if self.transport.meeting_state() != MeetingState::Left {
            if let Err(e) = self.transport.leave().await {
                warn!(
                    target: "call.session",
                    error = %e,
                    "Transport leave failed during shutdown"
                );
            }
        }

        self.tracker.clear();
        self.rebuild.clear();

        self.phase = match failure {
            Some(message) => {
                self.error_message = Some(message);
                SessionPhase::Failed
            }
            None => SessionPhase::Left,
        };

        info!(
            target: "call.session",
            reason = %reason,
            phase = ?self.phase,
            "Call session closed"
        );
    }

    fn snapshot(&mut self) -> CallSnapshot {
        CallSnapshot {
            phase: self.phase,
            local: self.roster.local.clone(),
            remotes: self.roster.remotes.clone(),
            camera_on: self.media.camera_on(),
            microphone_on: self.media.microphone_on(),
            waiting_seconds: self.timers.waiting_seconds(),
            duration_seconds: self.timers.duration_seconds(),
            auto_navigate_on_leave: self.auto_navigate_on_leave,
            started_at: self.started_at,
            notifications: self.notifications.visible().to_vec(),
            error_message: self.error_message.clone(),
        }
    }

    fn joined_elapsed(&self) -> Duration {
        self.joined_at.map_or(Duration::ZERO, |at| at.elapsed())
    }

    fn join_fire_at(&self) -> Instant {
        self.join_deadline.unwrap_or_else(Instant::now)
    }
}

//! Message types for the call session actor.
//!
//! Callers talk to the actor through strongly-typed commands over
//! `tokio::sync::mpsc`; request-reply commands carry a `tokio::sync::oneshot`
//! responder.

use crate::errors::CallError;
use crate::notifications::NotificationItem;
use crate::roster::Participant;
use chrono::{DateTime, Utc};
use common::types::EndReason;
use tokio::sync::oneshot;

/// Commands sent to the call session actor.
#[derive(Debug)]
pub enum SessionCommand {
    /// Acquire a room and join the call.
    Start {
        respond_to: oneshot::Sender<Result<(), CallError>>,
    },

    /// Toggle the camera; resolves to the actual resulting state.
    ToggleCamera {
        respond_to: oneshot::Sender<Result<bool, CallError>>,
    },

    /// Toggle the microphone; resolves to the actual resulting state.
    ToggleMicrophone {
        respond_to: oneshot::Sender<Result<bool, CallError>>,
    },

    /// Leave the call with an explicit reason.
    Leave {
        reason: EndReason,
        respond_to: oneshot::Sender<Result<(), CallError>>,
    },

    /// The page hosting the call was hidden (not a back/forward-cache
    /// restore). Dispatches keepalive termination.
    PageHidden,

    /// Final before-unload signal; fallback when page-hide never fired.
    PageUnload,

    /// Read the current session snapshot.
    GetSnapshot {
        respond_to: oneshot::Sender<CallSnapshot>,
    },
}

/// Call session lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Created,
    Joining,
    Joined,
    Leaving,
    Left,
    Failed,
}

impl SessionPhase {
    /// Whether the session has finished, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Left | SessionPhase::Failed)
    }
}

/// Read-model of the session: everything a UI layer renders.
#[derive(Debug, Clone)]
pub struct CallSnapshot {
    pub phase: SessionPhase,
    pub local: Option<Participant>,
    pub remotes: Vec<Participant>,
    pub camera_on: bool,
    pub microphone_on: bool,
    /// Seconds spent joined with no remote participant.
    pub waiting_seconds: u64,
    /// Seconds spent joined with at least one remote participant.
    pub duration_seconds: u64,
    /// Set by the auto-leave policies so the UI navigates away once the
    /// leave completes.
    pub auto_navigate_on_leave: bool,
    /// Wall-clock time the transport confirmed the join.
    pub started_at: Option<DateTime<Utc>>,
    pub notifications: Vec<NotificationItem>,
    /// User-facing message when the phase is `Failed`.
    pub error_message: Option<String>,
}

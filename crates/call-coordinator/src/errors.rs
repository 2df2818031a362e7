//! Call coordinator error types.
//!
//! Internal details are logged; anything shown to the user goes through
//! [`CallError::user_message`] or the backend error-code table in
//! [`user_message_for_code`], so raw transport or HTTP errors never leak
//! into the UI.

use crate::control::ControlPlaneError;
use crate::transport::TransportError;
use thiserror::Error;

/// Fallback message for unmapped failures.
const GENERIC_CALL_ERROR: &str = "Something went wrong with the call. Please try again.";

/// Call coordinator error type.
#[derive(Debug, Error)]
pub enum CallError {
    /// Control plane request failed or was rejected.
    #[error("control plane error: {0}")]
    Control(#[from] ControlPlaneError),

    /// The room URL failed scheme/host validation. Fatal configuration
    /// error; never retried.
    #[error("invalid room url: {0}")]
    InvalidRoomUrl(String),

    /// The join watchdog fired before the transport reported joined.
    #[error("timed out waiting to join the call")]
    JoinTimeout,

    /// Transport operation failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session actor is gone; the command cannot be delivered.
    #[error("call session is closed")]
    SessionClosed,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CallError {
    /// User-facing message for this error.
    ///
    /// Control-plane rejections map through the fixed error-code table;
    /// everything else gets a fixed per-category string. Unmapped codes and
    /// internal errors fall back to a generic message.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            CallError::Control(ControlPlaneError::Rejected { code, .. }) => {
                user_message_for_code(code.as_deref())
            }
            CallError::Control(_) => GENERIC_CALL_ERROR,
            CallError::InvalidRoomUrl(_) | CallError::Config(_) => {
                "The call service is misconfigured. Please contact support."
            }
            CallError::JoinTimeout => "The call took too long to connect. Please try again.",
            CallError::Transport(TransportError::Device(_)) => {
                "We couldn't access your camera or microphone."
            }
            CallError::Transport(_) => "The call connection failed. Please try again.",
            CallError::SessionClosed | CallError::Internal(_) => GENERIC_CALL_ERROR,
        }
    }

    /// Whether a fresh attempt by the user could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CallError::JoinTimeout | CallError::Transport(_) => true,
            CallError::Control(ControlPlaneError::Http(_)) => true,
            CallError::Control(ControlPlaneError::Rejected { .. })
            | CallError::InvalidRoomUrl(_)
            | CallError::SessionClosed
            | CallError::Config(_)
            | CallError::Internal(_) => false,
        }
    }
}

/// Map a backend error code to its user-facing message.
///
/// Codes come from the control plane's `error` field. Unknown or absent
/// codes fall back to the generic message.
#[must_use]
pub fn user_message_for_code(code: Option<&str>) -> &'static str {
    match code {
        Some("unauthorized") => "You are not allowed to join this call.",
        Some("conversation_not_found") => "This conversation no longer exists.",
        Some("active_call_exists") => "A call is already in progress for this conversation.",
        Some("room_create_failed") => {
            "The call service is temporarily unavailable. Please try again."
        }
        _ => GENERIC_CALL_ERROR,
    }
}

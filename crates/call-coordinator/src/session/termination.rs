//! Exactly-once call termination.
//!
//! Five exit paths can try to end a call: manual hangup, solo timeout,
//! max-duration cutoff, error, and page close. Whichever fires first claims
//! the termination record; everyone else sees the claim and backs off. A
//! failed foreground attempt releases the claim so a later exit path can
//! retry. The page-close path dispatches detached and claims immediately:
//! there is nobody left to await a confirmation.

use crate::control::ControlPlane;
use common::types::{ConversationId, EndReason};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerminationState {
    Idle,
    Attempting,
    Terminated,
}

/// Guards the single server-side end-call per session.
pub struct TerminationCoordinator {
    control: Arc<dyn ControlPlane>,
    conversation_id: ConversationId,
    state: Mutex<TerminationState>,
}

impl TerminationCoordinator {
    #[must_use]
    pub fn new(control: Arc<dyn ControlPlane>, conversation_id: ConversationId) -> Self {
        Self {
            control,
            conversation_id,
            state: Mutex::new(TerminationState::Idle),
        }
    }

    /// Attempt server-side termination with `reason`.
    ///
    /// Returns true when this call dispatched the remote operation. A
    /// concurrent or repeated call while a claim is held returns false
    /// without touching the network. Foreground failure resets the record
    /// to idle so a later exit path retries; it is never surfaced as fatal.
    pub async fn terminate(&self, reason: EndReason) -> bool {
        {
            let mut state = self.state.lock().await;
            if *state != TerminationState::Idle {
                debug!(
                    target: "call.termination",
                    conversation_id = %self.conversation_id,
                    reason = %reason,
                    "Termination already claimed, skipping"
                );
                return false;
            }
            *state = TerminationState::Attempting;
        }

        if reason == EndReason::PageClose {
            // The page is going away: dispatch detached and mark done on
            // send. There is no retry window on this path.
            self.control
                .end_call_detached(&self.conversation_id, reason);
            *self.state.lock().await = TerminationState::Terminated;
            info!(
                target: "call.termination",
                conversation_id = %self.conversation_id,
                "Detached termination dispatched on page close"
            );
            return true;
        }

        match self.control.end_call(&self.conversation_id, reason).await {
            Ok(()) => {
                *self.state.lock().await = TerminationState::Terminated;
                info!(
                    target: "call.termination",
                    conversation_id = %self.conversation_id,
                    reason = %reason,
                    "Call terminated"
                );
                true
            }
            Err(e) => {
                *self.state.lock().await = TerminationState::Idle;
                warn!(
                    target: "call.termination",
                    conversation_id = %self.conversation_id,
                    reason = %reason,
                    error = %e,
                    "End-call failed; a later leave may retry"
                );
                false
            }
        }
    }

    /// Whether a termination has completed (or been dispatched detached).
    pub async fn is_terminated(&self) -> bool {
        *self.state.lock().await == TerminationState::Terminated
    }
}


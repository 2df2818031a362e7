//! Common data types for the call coordinator workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the conversation a call belongs to.
///
/// Conversations outlive individual call attempts; every control-plane
/// operation is keyed by this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Why a call session is being opened.
///
/// `Start` is the initiating side; `Join` is a later joiner. Recovery from
/// an expired room is only permitted for the session's own `Start` intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomIntent {
    Start,
    Join,
}

impl fmt::Display for RoomIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomIntent::Start => f.write_str("start"),
            RoomIntent::Join => f.write_str("join"),
        }
    }
}

/// Why a call session ended.
///
/// Sent to the control plane's end-call operation and used for exactly-once
/// termination bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Manual,
    SoloTimeout,
    MaxDuration,
    Error,
    PageClose,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Manual => f.write_str("manual"),
            EndReason::SoloTimeout => f.write_str("solo_timeout"),
            EndReason::MaxDuration => f.write_str("max_duration"),
            EndReason::Error => f.write_str("error"),
            EndReason::PageClose => f.write_str("page_close"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_serializes_transparently() {
        let id = ConversationId::from("conv-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"conv-42\"");
    }

    #[test]
    fn test_room_intent_wire_format() {
        assert_eq!(serde_json::to_string(&RoomIntent::Start).unwrap(), "\"start\"");
        assert_eq!(serde_json::to_string(&RoomIntent::Join).unwrap(), "\"join\"");
    }

    #[test]
    fn test_end_reason_wire_format() {
        assert_eq!(
            serde_json::to_string(&EndReason::SoloTimeout).unwrap(),
            "\"solo_timeout\""
        );
        assert_eq!(
            serde_json::to_string(&EndReason::PageClose).unwrap(),
            "\"page_close\""
        );
        assert_eq!(EndReason::MaxDuration.to_string(), "max_duration");
    }
}

//! Room lifecycle management.
//!
//! A room is acquired from the control plane at most once per
//! `(conversation, intent, force_new)` key while a request is in flight:
//! concurrent acquisitions collapse onto one remote call and share its
//! result. The acquirer is scoped to a session and dropped with it, so no
//! acquisition state leaks into a later session for the same conversation.

use crate::control::ControlPlane;
use crate::errors::CallError;
use common::types::{ConversationId, RoomIntent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use url::Url;

/// A resolved call room. Immutable once resolved; expiry produces a new
/// `Room`, never a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
    pub url: Url,
    /// Whether the backend reused an existing room for this conversation.
    pub reused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AcquireKey {
    conversation_id: ConversationId,
    intent: RoomIntent,
    force_new: bool,
}

/// Idempotent room acquisition for one call session.
pub struct RoomAcquirer {
    control: Arc<dyn ControlPlane>,
    allowed_host_suffix: String,
    in_flight: Mutex<HashMap<AcquireKey, Arc<OnceCell<Room>>>>,
}

impl RoomAcquirer {
    pub fn new(control: Arc<dyn ControlPlane>, allowed_host_suffix: impl Into<String>) -> Self {
        Self {
            control,
            allowed_host_suffix: allowed_host_suffix.into(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a room for `conversation_id`.
    ///
    /// Concurrent calls with an identical key share one in-flight remote
    /// call and receive equal results. The in-flight entry is removed once
    /// the flight settles; a later call for the same key goes back to the
    /// control plane and relies on its reuse semantics.
    pub async fn acquire(
        &self,
        conversation_id: &ConversationId,
        intent: RoomIntent,
        force_new: bool,
    ) -> Result<Room, CallError> {
        let key = AcquireKey {
            conversation_id: conversation_id.clone(),
            intent,
            force_new,
        };

        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(
                in_flight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let result = cell
            .get_or_try_init(|| self.acquire_remote(conversation_id, intent, force_new))
            .await
            .map(Clone::clone);

        {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.remove(&key);
        }

        result
    }

    async fn acquire_remote(
        &self,
        conversation_id: &ConversationId,
        intent: RoomIntent,
        force_new: bool,
    ) -> Result<Room, CallError> {
        debug!(
            target: "call.rooms",
            conversation_id = %conversation_id,
            intent = %intent,
            force_new,
            "Acquiring room"
        );

        let response = self
            .control
            .create_room(conversation_id, intent, force_new)
            .await?;

        if !response.success {
            return Err(CallError::Control(
                crate::control::ControlPlaneError::Rejected {
                    code: response.error.clone(),
                    message: format!(
                        "create_room rejected with code {}",
                        response.error.as_deref().unwrap_or("unknown")
                    ),
                },
            ));
        }

        let descriptor = response.room.ok_or_else(|| {
            CallError::Internal("create_room succeeded without a room".to_string())
        })?;

        let url = self.validate_url(&descriptor.url)?;

        info!(
            target: "call.rooms",
            conversation_id = %conversation_id,
            room = %descriptor.name,
            reused = response.reused,
            "Room acquired"
        );

        Ok(Room {
            name: descriptor.name,
            url,
            reused: response.reused,
        })
    }

    /// Validate a room URL before any join attempt.
    ///
    /// Only `https` and only hosts under the allowed suffix are accepted.
    /// A failure here is a configuration error, not a retry candidate.
    fn validate_url(&self, raw: &str) -> Result<Url, CallError> {
        let url = Url::parse(raw)
            .map_err(|e| CallError::InvalidRoomUrl(format!("unparseable url {raw:?}: {e}")))?;

        if url.scheme() != "https" {
            return Err(CallError::InvalidRoomUrl(format!(
                "scheme {:?} is not https",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| CallError::InvalidRoomUrl(format!("url {raw:?} has no host")))?;

        if !host.ends_with(&self.allowed_host_suffix) {
            return Err(CallError::InvalidRoomUrl(format!(
                "host {host:?} is outside the allowed suffix {:?}",
                self.allowed_host_suffix
            )));
        }

        Ok(url)
    }
}


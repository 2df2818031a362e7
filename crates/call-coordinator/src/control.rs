//! Call control plane client.
//!
//! The backend owns call records; the coordinator reaches it through two
//! operations: `create_room` and `end_call`. Both are idempotency-aware on
//! the server side and keyed by conversation id.
//!
//! The page-close path cannot await a response (the caller is being torn
//! down), so the trait also carries [`ControlPlane::end_call_detached`]: a
//! keepalive-style dispatch that outlives the caller and still carries the
//! bearer credential, which plain fire-and-forget beacons cannot.

use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use common::types::{ConversationId, EndReason, RoomIntent};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Connect timeout for control-plane requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Overall request timeout for control-plane requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Request timeout for the detached end-call dispatch. Short: the page-close
/// window is brief and there is nobody left to read the response.
const DETACHED_TIMEOUT: Duration = Duration::from_secs(5);

/// Control plane failures.
#[derive(Debug, Clone, Error)]
pub enum ControlPlaneError {
    /// The request never produced a usable response.
    #[error("control plane request failed: {0}")]
    Http(String),

    /// The backend answered but refused the operation.
    #[error("control plane rejected request: {message}")]
    Rejected {
        /// Backend error code, mapped to a user message by the caller.
        code: Option<String>,
        message: String,
    },
}

/// Wire shape of a room in a `create_room` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomDescriptor {
    pub name: String,
    pub url: String,
}

/// Response of the `create_room` operation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomResponse {
    pub success: bool,
    pub room: Option<RoomDescriptor>,
    /// Whether the backend handed back an existing room for this
    /// conversation instead of allocating a new one.
    #[serde(default)]
    pub reused: bool,
    /// Whether a call is already marked active for this conversation.
    #[serde(default)]
    pub active_call: bool,
    /// Backend error code when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateRoomRequest<'a> {
    conversation_id: &'a ConversationId,
    intent: RoomIntent,
    force_new: bool,
}

#[derive(Debug, Serialize)]
struct EndCallRequest<'a> {
    conversation_id: &'a ConversationId,
    reason: EndReason,
}

#[derive(Debug, Deserialize)]
struct EndCallResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// The control-plane operations the coordinator depends on.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Acquire (or reuse) a call room for a conversation.
    async fn create_room(
        &self,
        conversation_id: &ConversationId,
        intent: RoomIntent,
        force_new: bool,
    ) -> Result<CreateRoomResponse, ControlPlaneError>;

    /// Terminate the call record for a conversation.
    async fn end_call(
        &self,
        conversation_id: &ConversationId,
        reason: EndReason,
    ) -> Result<(), ControlPlaneError>;

    /// Dispatch an end-call request that outlives the caller. No result is
    /// reported; the page-close path marks termination done on send.
    fn end_call_detached(&self, conversation_id: &ConversationId, reason: EndReason);
}

/// HTTP/JSON implementation of the control plane.
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl HttpControlPlane {
    /// Create a client for the control plane at `base_url`.
    ///
    /// Timeouts are conservative so an unreachable backend fails fast
    /// instead of hanging a join attempt.
    pub fn new(base_url: impl Into<String>, api_token: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_token.expose_secret())
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn create_room(
        &self,
        conversation_id: &ConversationId,
        intent: RoomIntent,
        force_new: bool,
    ) -> Result<CreateRoomResponse, ControlPlaneError> {
        let request = CreateRoomRequest {
            conversation_id,
            intent,
            force_new,
        };

        let response = self
            .client
            .post(format!("{}/call/rooms", self.base_url))
            .header("authorization", self.bearer())
            .json(&request)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Http(format!("create_room send failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ControlPlaneError::Http(format!(
                "create_room returned status {}",
                response.status()
            )));
        }

        let body: CreateRoomResponse = response
            .json()
            .await
            .map_err(|e| ControlPlaneError::Http(format!("create_room decode failed: {e}")))?;

        debug!(
            target: "call.control",
            conversation_id = %conversation_id,
            intent = %intent,
            force_new,
            success = body.success,
            reused = body.reused,
            "create_room completed"
        );

        Ok(body)
    }

    async fn end_call(
        &self,
        conversation_id: &ConversationId,
        reason: EndReason,
    ) -> Result<(), ControlPlaneError> {
        let request = EndCallRequest {
            conversation_id,
            reason,
        };

        let response = self
            .client
            .post(format!("{}/call/end", self.base_url))
            .header("authorization", self.bearer())
            .json(&request)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Http(format!("end_call send failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ControlPlaneError::Http(format!(
                "end_call returned status {}",
                response.status()
            )));
        }

        let body: EndCallResponse = response
            .json()
            .await
            .map_err(|e| ControlPlaneError::Http(format!("end_call decode failed: {e}")))?;

        if body.success {
            debug!(
                target: "call.control",
                conversation_id = %conversation_id,
                reason = %reason,
                "end_call completed"
            );
            Ok(())
        } else {
            Err(ControlPlaneError::Rejected {
                code: body.error.clone(),
                message: format!(
                    "end_call rejected with code {}",
                    body.error.as_deref().unwrap_or("unknown")
                ),
            })
        }
    }

    fn end_call_detached(&self, conversation_id: &ConversationId, reason: EndReason) {
        let client = self.client.clone();
        let url = format!("{}/call/end", self.base_url);
        let bearer = self.bearer();
        let body = serde_json::json!({
            "conversation_id": conversation_id,
            "reason": reason,
        });
        let conversation = conversation_id.clone();

        // The spawned task holds everything it needs; the caller can be
        // dropped immediately after this returns.
        tokio::spawn(async move {
            let result = client
                .post(url)
                .header("authorization", bearer)
                .timeout(DETACHED_TIMEOUT)
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) => debug!(
                    target: "call.control",
                    conversation_id = %conversation,
                    reason = %reason,
                    status = %response.status(),
                    "detached end_call dispatched"
                ),
                Err(e) => warn!(
                    target: "call.control",
                    conversation_id = %conversation,
                    reason = %reason,
                    error = %e,
                    "detached end_call failed"
                ),
            }
        });
    }
}

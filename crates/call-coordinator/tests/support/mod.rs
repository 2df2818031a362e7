//! Shared rig for session actor integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use call_coordinator::config::CallConfig;
use call_coordinator::session::{CallSessionActor, CallSessionHandle, SessionPhase};
use common::types::{ConversationId, RoomIntent};
use coordinator_test_utils::{MockControlPlane, MockTransport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Config with the standard test endpoints and optional overrides.
pub fn test_config(overrides: &[(&str, &str)]) -> CallConfig {
    let mut vars = HashMap::from([
        (
            "CALL_CONTROL_PLANE_URL".to_string(),
            "https://api.example.com".to_string(),
        ),
        ("CALL_API_TOKEN".to_string(), "tok-test".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }
    CallConfig::from_vars(&vars).expect("test config should load")
}

/// Spawn a session actor against the given mocks.
pub fn spawn_session(
    config: CallConfig,
    transport: &Arc<MockTransport>,
    control: &Arc<MockControlPlane>,
    intent: RoomIntent,
) -> (CallSessionHandle, JoinHandle<()>) {
    CallSessionActor::spawn(
        config,
        Arc::clone(transport) as Arc<dyn call_coordinator::transport::CallTransport>,
        Arc::clone(control) as Arc<dyn call_coordinator::control::ControlPlane>,
        ConversationId::from("conv-test"),
        intent,
        "Me".to_string(),
        "local-user".to_string(),
    )
}

/// Poll snapshots until the session reaches `phase`.
pub async fn wait_for_phase(handle: &CallSessionHandle, phase: SessionPhase) {
    for _ in 0..100 {
        if handle.snapshot().await.expect("snapshot").phase == phase {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("session never reached {phase:?}");
}

/// Advance paused time one second at a time so every timer tick is observed.
pub async fn advance_seconds(seconds: u64) {
    for _ in 0..seconds {
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }
}

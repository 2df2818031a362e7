//! Call Coordinator Library
//!
//! Turns a raw, asynchronous, multi-party real-time media transport into a
//! consistent, race-free, privacy-safe call experience:
//!
//! - Idempotent room acquisition with reuse/force-new semantics
//! - Reconciliation of noisy participant snapshots into a stable roster
//! - Local camera/microphone state derived from the transport's actual
//!   state, never from optimistic intent
//! - Waiting/duration timers driving two auto-leave policies
//! - Exactly-once server-side call termination across five exit paths
//!
//! # Architecture
//!
//! One actor owns one call attempt:
//!
//! ```text
//! CallSessionActor (one per call attempt)
//! ├── RoomAcquirer          (idempotent room acquisition)
//! ├── MediaSync             (actual-state camera/mic flags)
//! ├── TrackStateTracker     (track-event dedup) + RebuildScheduler
//! ├── SessionTimers         (waiting/duration counters)
//! ├── TerminationCoordinator (exactly-once end-call)
//! └── NotificationQueue     (deduplicated join/leave toasts)
//! ```
//!
//! The actor consumes two external collaborators through narrow traits:
//! [`transport::CallTransport`] (the real-time media SDK) and
//! [`control::ControlPlane`] (the backend's create-room/end-call
//! operations). Everything in between - roster reconciliation, debouncing,
//! timers, termination bookkeeping - is owned by the actor and dropped with
//! it, so no state leaks into a later session for the same conversation.
//!
//! # Modules
//!
//! - [`session`] - the call session actor and its state machines
//! - [`roster`] - pure participant reconciliation
//! - [`rooms`] - room lifecycle management
//! - [`tracks`] - track-event dedup and rebuild coalescing
//! - [`media`] - local media state synchronization
//! - [`notifications`] - join/leave notifications
//! - [`control`] - control plane client
//! - [`transport`] - the transport seam
//! - [`config`] - environment-driven configuration
//! - [`errors`] - error taxonomy and user-facing messages

#![warn(clippy::pedantic)]

pub mod config;
pub mod control;
pub mod errors;
pub mod media;
pub mod notifications;
pub mod rooms;
pub mod roster;
pub mod session;
pub mod tracks;
pub mod transport;

pub use config::CallConfig;
pub use errors::CallError;
pub use session::{CallSessionActor, CallSessionHandle, CallSnapshot, SessionPhase};

//! Call session actor and its supporting state machines.
//!
//! - [`coordinator`] - the per-call actor and its handle
//! - [`messages`] - commands, phases, and the session snapshot
//! - [`termination`] - exactly-once server-side call termination
//! - [`timers`] - waiting/duration counters and the solo timeout

pub mod coordinator;
pub mod messages;
pub mod termination;
pub mod timers;

pub use coordinator::{CallSessionActor, CallSessionHandle};
pub use messages::{CallSnapshot, SessionCommand, SessionPhase};
pub use termination::TerminationCoordinator;
pub use timers::SessionTimers;

//! # Coordinator Test Utilities
//!
//! Shared test utilities for the call coordinator.
//!
//! Provides scriptable mock implementations of the two external seams so
//! coordinator behavior can be tested without real infrastructure:
//!
//! - [`MockTransport`] - a [`call_coordinator::transport::CallTransport`]
//!   with a controllable participant snapshot, scriptable join results, and
//!   an event injection channel
//! - [`MockControlPlane`] - a [`call_coordinator::control::ControlPlane`]
//!   with call counters, scriptable rejections/failures, and per-call room
//!   rotation for expiry tests
//! - [`fixtures`] - raw participant builders for snapshot tests

pub mod fixtures;
pub mod mock_control;
pub mod mock_transport;

pub use fixtures::{local_participant, remote_participant};
pub use mock_control::MockControlPlane;
pub use mock_transport::MockTransport;

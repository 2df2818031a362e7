//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use these types
//! for all sensitive values like API tokens and credentials.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` and holds a secret gets safe logging behavior for free,
//! and secrets are zeroized when dropped. Access to the inner value requires
//! an explicit `expose_secret()` call.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Credentials {
//!     user: String,
//!     api_token: SecretString,
//! }
//!
//! let creds = Credentials {
//!     user: "alice".to_string(),
//!     api_token: SecretString::from("tok-123"),
//! };
//!
//! // Debug output redacts the token.
//! let rendered = format!("{creds:?}");
//! assert!(!rendered.contains("tok-123"));
//!
//! // Reading the value is explicit.
//! assert_eq!(creds.api_token.expose_secret(), "tok-123");
//! ```

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

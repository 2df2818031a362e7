//! Call coordinator configuration.
//!
//! Configuration is loaded from environment variables. The control-plane
//! API token is redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default solo timeout: leave after 30 minutes alone in the call.
pub const DEFAULT_SOLO_TIMEOUT_SECONDS: u64 = 1800;

/// Default maximum call duration: 2 hours of wall-clock from room join.
pub const DEFAULT_MAX_CALL_DURATION_SECONDS: u64 = 7200;

/// Default polling interval for the max-duration budget check.
pub const DEFAULT_DURATION_POLL_INTERVAL_SECONDS: u64 = 10;

/// Default coalescing window for track-event roster rebuilds.
pub const DEFAULT_TRACK_DEBOUNCE_MILLIS: u64 = 50;

/// Default dedup window for join/leave notifications.
pub const DEFAULT_NOTIFICATION_DEDUP_SECONDS: u64 = 5;

/// Default visible lifetime of a notification.
pub const DEFAULT_NOTIFICATION_DISPLAY_SECONDS: u64 = 4;

/// Default join watchdog timeout.
pub const DEFAULT_JOIN_TIMEOUT_SECONDS: u64 = 15;

/// Default allowed host suffix for room URLs.
pub const DEFAULT_ALLOWED_ROOM_HOST_SUFFIX: &str = ".daily.co";

/// Call coordinator configuration.
///
/// Loaded from environment variables with sensible defaults. The API token
/// is redacted in Debug output.
#[derive(Clone)]
pub struct CallConfig {
    /// Base URL of the call control plane.
    pub control_plane_url: String,

    /// Bearer token for control-plane requests.
    /// Protected by `SecretString` to prevent accidental logging.
    pub api_token: SecretString,

    /// Required host suffix for acquired room URLs.
    pub allowed_room_host_suffix: String,

    /// How long a joined session may stay alone before auto-leaving.
    pub solo_timeout: Duration,

    /// Wall-clock budget for a call, measured from room join.
    pub max_call_duration: Duration,

    /// How often the max-duration budget is checked.
    pub duration_poll_interval: Duration,

    /// Coalescing window for track-event roster rebuilds.
    pub track_debounce: Duration,

    /// Dedup window for join/leave notifications.
    pub notification_dedup_window: Duration,

    /// Visible lifetime of a notification.
    pub notification_display_duration: Duration,

    /// Join watchdog timeout.
    pub join_timeout: Duration,
}

/// Custom Debug implementation that redacts the API token.
impl fmt::Debug for CallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallConfig")
            .field("control_plane_url", &self.control_plane_url)
            .field("api_token", &"[REDACTED]")
            .field("allowed_room_host_suffix", &self.allowed_room_host_suffix)
            .field("solo_timeout", &self.solo_timeout)
            .field("max_call_duration", &self.max_call_duration)
            .field("duration_poll_interval", &self.duration_poll_interval)
            .field("track_debounce", &self.track_debounce)
            .field("notification_dedup_window", &self.notification_dedup_window)
            .field(
                "notification_display_duration",
                &self.notification_display_duration,
            )
            .field("join_timeout", &self.join_timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl CallConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let control_plane_url = vars
            .get("CALL_CONTROL_PLANE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CALL_CONTROL_PLANE_URL".to_string()))?
            .clone();

        let api_token = SecretString::from(
            vars.get("CALL_API_TOKEN")
                .ok_or_else(|| ConfigError::MissingEnvVar("CALL_API_TOKEN".to_string()))?
                .clone(),
        );

        let allowed_room_host_suffix = vars
            .get("CALL_ALLOWED_ROOM_HOST_SUFFIX")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ALLOWED_ROOM_HOST_SUFFIX.to_string());

        let seconds = |name: &str, default: u64| {
            vars.get(name)
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        let solo_timeout = Duration::from_secs(seconds(
            "CALL_SOLO_TIMEOUT_SECONDS",
            DEFAULT_SOLO_TIMEOUT_SECONDS,
        ));
        let max_call_duration = Duration::from_secs(seconds(
            "CALL_MAX_DURATION_SECONDS",
            DEFAULT_MAX_CALL_DURATION_SECONDS,
        ));
        let duration_poll_interval = Duration::from_secs(seconds(
            "CALL_DURATION_POLL_INTERVAL_SECONDS",
            DEFAULT_DURATION_POLL_INTERVAL_SECONDS,
        ));
        let track_debounce = Duration::from_millis(seconds(
            "CALL_TRACK_DEBOUNCE_MILLIS",
            DEFAULT_TRACK_DEBOUNCE_MILLIS,
        ));
        let notification_dedup_window = Duration::from_secs(seconds(
            "CALL_NOTIFICATION_DEDUP_SECONDS",
            DEFAULT_NOTIFICATION_DEDUP_SECONDS,
        ));
        let notification_display_duration = Duration::from_secs(seconds(
            "CALL_NOTIFICATION_DISPLAY_SECONDS",
            DEFAULT_NOTIFICATION_DISPLAY_SECONDS,
        ));
        let join_timeout = Duration::from_secs(seconds(
            "CALL_JOIN_TIMEOUT_SECONDS",
            DEFAULT_JOIN_TIMEOUT_SECONDS,
        ));

        Ok(CallConfig {
            control_plane_url,
            api_token,
            allowed_room_host_suffix,
            solo_timeout,
            max_call_duration,
            duration_poll_interval,
            track_debounce,
            notification_dedup_window,
            notification_display_duration,
            join_timeout,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "CALL_CONTROL_PLANE_URL".to_string(),
                "https://api.example.com".to_string(),
            ),
            ("CALL_API_TOKEN".to_string(), "tok-test-12345".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = CallConfig::from_vars(&base_vars()).expect("config should load");

        assert_eq!(config.control_plane_url, "https://api.example.com");
        assert_eq!(
            config.allowed_room_host_suffix,
            DEFAULT_ALLOWED_ROOM_HOST_SUFFIX
        );
        assert_eq!(config.solo_timeout, Duration::from_secs(1800));
        assert_eq!(config.max_call_duration, Duration::from_secs(7200));
        assert_eq!(config.duration_poll_interval, Duration::from_secs(10));
        assert_eq!(config.track_debounce, Duration::from_millis(50));
        assert_eq!(config.notification_dedup_window, Duration::from_secs(5));
        assert_eq!(config.notification_display_duration, Duration::from_secs(4));
        assert_eq!(config.join_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_from_vars_custom_values() {
        let mut vars = base_vars();
        vars.insert("CALL_SOLO_TIMEOUT_SECONDS".to_string(), "600".to_string());
        vars.insert("CALL_MAX_DURATION_SECONDS".to_string(), "3600".to_string());
        vars.insert("CALL_TRACK_DEBOUNCE_MILLIS".to_string(), "100".to_string());
        vars.insert(
            "CALL_ALLOWED_ROOM_HOST_SUFFIX".to_string(),
            ".rooms.example.net".to_string(),
        );

        let config = CallConfig::from_vars(&vars).expect("config should load");

        assert_eq!(config.solo_timeout, Duration::from_secs(600));
        assert_eq!(config.max_call_duration, Duration::from_secs(3600));
        assert_eq!(config.track_debounce, Duration::from_millis(100));
        assert_eq!(config.allowed_room_host_suffix, ".rooms.example.net");
    }

    #[test]
    fn test_from_vars_missing_control_plane_url() {
        let mut vars = base_vars();
        vars.remove("CALL_CONTROL_PLANE_URL");

        let result = CallConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "CALL_CONTROL_PLANE_URL")
        );
    }

    #[test]
    fn test_from_vars_missing_api_token() {
        let mut vars = base_vars();
        vars.remove("CALL_API_TOKEN");

        let result = CallConfig::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "CALL_API_TOKEN"));
    }

    #[test]
    fn test_debug_redacts_api_token() {
        let config = CallConfig::from_vars(&base_vars()).expect("config should load");
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok-test-12345"));
    }
}

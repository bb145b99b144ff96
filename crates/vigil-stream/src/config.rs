//! Live-stream configuration.

use std::time::Duration;

use vigil_track::TrackerConfig;

/// Session manager configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Run detection every Nth frame; intermediate frames reuse the last
    /// confirmed boxes
    pub detect_every: u64,
    /// Consecutive read failures before the session fails
    pub max_consecutive_errors: u32,
    /// Minimum wall time per relayed frame (relay rate ceiling)
    pub frame_interval: Duration,
    /// Pause after a recoverable read failure
    pub error_backoff: Duration,
    /// Tracker lifecycle parameters
    pub n_init: u32,
    pub max_age: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            detect_every: 3,
            max_consecutive_errors: 5,
            frame_interval: Duration::from_millis(33),
            error_backoff: Duration::from_millis(100),
            n_init: 3,
            max_age: 30,
        }
    }
}

impl StreamConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            detect_every: std::env::var("VIGIL_STREAM_DETECT_EVERY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.detect_every),
            max_consecutive_errors: std::env::var("VIGIL_STREAM_MAX_ERRORS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_consecutive_errors),
            n_init: std::env::var("VIGIL_TRACK_N_INIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.n_init),
            max_age: std::env::var("VIGIL_TRACK_MAX_AGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_age),
            ..defaults
        }
    }

    /// Tracker configuration for one session.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            n_init: self.n_init,
            max_age: self.max_age,
            ..TrackerConfig::default()
        }
    }
}

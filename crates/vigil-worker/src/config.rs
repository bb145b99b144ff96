//! Worker configuration.

use vigil_track::TrackerConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Consecutive read failures tolerated mid-file before the job fails
    pub max_read_retries: u32,
    /// Tracker lifecycle parameters
    pub n_init: u32,
    pub max_age: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            max_read_retries: 5,
            n_init: 3,
            max_age: 30,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: std::env::var("VIGIL_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_concurrent_jobs),
            max_read_retries: std::env::var("VIGIL_MAX_READ_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_read_retries),
            n_init: std::env::var("VIGIL_TRACK_N_INIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.n_init),
            max_age: std::env::var("VIGIL_TRACK_MAX_AGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_age),
        }
    }

    /// Tracker configuration for one job.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            n_init: self.n_init,
            max_age: self.max_age,
            ..TrackerConfig::default()
        }
    }
}
